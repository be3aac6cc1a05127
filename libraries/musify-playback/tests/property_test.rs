//! Property-based tests for the playback queue
//!
//! Uses proptest to verify queue invariants across random operation
//! sequences, sizes and flag combinations.

use musify_core::Track;
use musify_playback::{Direction, Queue, RepeatMode};
use proptest::prelude::*;
use std::collections::HashSet;

// ===== Helpers =====

fn tracks(len: usize) -> Vec<Track> {
    (0..len)
        .map(|i| Track::new(format!("T{}", i), format!("Track {}", i), "Artist"))
        .collect()
}

fn arbitrary_repeat() -> impl Strategy<Value = RepeatMode> {
    prop_oneof![
        Just(RepeatMode::Off),
        Just(RepeatMode::All),
        Just(RepeatMode::One)
    ]
}

#[derive(Debug, Clone)]
enum Op {
    Next,
    Previous,
    ToggleShuffle,
    CycleRepeat,
    Append(usize),
    JumpTo(usize),
}

fn arbitrary_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => Just(Op::Next),
        2 => Just(Op::Previous),
        1 => Just(Op::ToggleShuffle),
        1 => Just(Op::CycleRepeat),
        1 => (1usize..4).prop_map(Op::Append),
        1 => (0usize..60).prop_map(Op::JumpTo),
    ]
}

// ===== Property Tests =====

proptest! {
    /// Property: the current index stays in bounds whatever happens
    #[test]
    fn current_index_always_in_bounds(
        len in 1usize..30,
        start in 0usize..30,
        ops in prop::collection::vec(arbitrary_op(), 1..60)
    ) {
        let mut queue = Queue::new();
        let start = start % len;
        queue.set_queue(tracks(len), start).unwrap();

        for op in ops {
            match op {
                Op::Next => { queue.advance(Direction::Next); }
                Op::Previous => { queue.advance(Direction::Previous); }
                Op::ToggleShuffle => { queue.toggle_shuffle(); }
                Op::CycleRepeat => { queue.cycle_repeat(); }
                Op::Append(count) => queue.append(tracks(count)),
                Op::JumpTo(index) => { let _ = queue.jump_to(index); }
            }

            let index = queue.current_index();
            prop_assert!(index.is_some());
            prop_assert!(index.unwrap_or(usize::MAX) < queue.len());
        }
    }

    /// Property: a failed advance leaves the queue where it was
    #[test]
    fn failed_advance_changes_nothing(
        len in 1usize..20,
        shuffle in any::<bool>(),
        steps in 0usize..40
    ) {
        let mut queue = Queue::new();
        queue.set_queue(tracks(len), 0).unwrap();
        if shuffle {
            queue.toggle_shuffle();
        }

        for _ in 0..steps {
            let before = queue.current_index();
            if queue.advance(Direction::Next).is_none() {
                prop_assert_eq!(queue.current_index(), before);
            }
        }
    }

    /// Property: sequential next with repeat off reaches the last index in
    /// len - 1 steps, then stops
    #[test]
    fn sequential_pass_reaches_end(len in 2usize..40) {
        let mut queue = Queue::new();
        queue.set_queue(tracks(len), 0).unwrap();

        for _ in 0..len - 1 {
            prop_assert!(queue.advance(Direction::Next).is_some());
        }
        prop_assert_eq!(queue.current_index(), Some(len - 1));
        prop_assert!(queue.advance(Direction::Next).is_none());
        prop_assert_eq!(queue.current_index(), Some(len - 1));
    }

    /// Property: shuffled next without repeat plays every track exactly once
    #[test]
    fn shuffle_pass_is_a_permutation(len in 2usize..40, start in 0usize..40) {
        let mut queue = Queue::new();
        let start = start % len;
        queue.set_queue(tracks(len), start).unwrap();
        queue.toggle_shuffle();

        let mut played = HashSet::from([start]);
        while queue.advance(Direction::Next).is_some() {
            let index = queue.current_index().unwrap_or(usize::MAX);
            prop_assert!(played.insert(index), "index {} played twice", index);
        }

        prop_assert_eq!(played.len(), len);
    }

    /// Property: shuffle never picks the current index while there are others
    #[test]
    fn shuffle_never_repeats_current(
        len in 2usize..20,
        repeat in arbitrary_repeat().prop_filter("one replays by definition", |r| *r != RepeatMode::One),
        steps in 1usize..50
    ) {
        let mut queue = Queue::new();
        queue.set_queue(tracks(len), 0).unwrap();
        queue.toggle_shuffle();
        queue.set_repeat(repeat);

        for _ in 0..steps {
            let before = queue.current_index();
            match queue.advance(Direction::Next) {
                Some(_) => prop_assert_ne!(queue.current_index(), before),
                None => break,
            }
        }
    }

    /// Property: repeat one always replays, in both directions
    #[test]
    fn repeat_one_is_sticky(
        len in 1usize..20,
        start in 0usize..20,
        shuffle in any::<bool>(),
        directions in prop::collection::vec(any::<bool>(), 1..20)
    ) {
        let mut queue = Queue::new();
        let start = start % len;
        queue.set_queue(tracks(len), start).unwrap();
        queue.set_repeat(RepeatMode::One);
        if shuffle {
            queue.toggle_shuffle();
        }

        for forward in directions {
            let direction = if forward { Direction::Next } else { Direction::Previous };
            prop_assert!(queue.advance(direction).is_some());
            prop_assert_eq!(queue.current_index(), Some(start));
        }
    }

    /// Property: shuffle only changes selection, never the order of tracks
    #[test]
    fn shuffle_preserves_order(len in 1usize..30, steps in 0usize..30) {
        let mut queue = Queue::new();
        let original = tracks(len);
        queue.set_queue(original.clone(), 0).unwrap();
        queue.toggle_shuffle();
        queue.set_repeat(RepeatMode::All);

        for _ in 0..steps {
            queue.advance(Direction::Next);
        }

        prop_assert_eq!(queue.tracks(), original.as_slice());
    }
}
