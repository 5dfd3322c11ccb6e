//! Property-based tests for queue ordering

use proptest::prelude::*;
use tunecast::{Requester, ResolvedTrack, TrackQueue};

#[derive(Debug, Clone)]
enum Op {
    Append(String),
    Pop,
    Peek,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => "[a-z]{1,8}".prop_map(Op::Append),
        2 => Just(Op::Pop),
        1 => Just(Op::Peek),
    ]
}

fn track(title: &str) -> ResolvedTrack {
    ResolvedTrack::new(title, "https://cdn.example/stream", Requester::new(1, "ana"))
}

proptest! {
    #[test]
    fn pops_follow_append_order(titles in prop::collection::vec("[a-z]{1,8}", 0..50)) {
        let mut queue = TrackQueue::new();
        for title in &titles {
            queue.append(track(title));
        }

        let mut popped = Vec::new();
        while let Some(track) = queue.pop_front() {
            popped.push(track.title);
        }

        prop_assert_eq!(popped, titles);
        prop_assert!(queue.is_empty());
    }

    #[test]
    fn interleaved_ops_match_reference(ops in prop::collection::vec(op_strategy(), 0..100)) {
        let mut queue = TrackQueue::new();
        let mut reference = std::collections::VecDeque::new();

        for op in ops {
            match op {
                Op::Append(title) => {
                    queue.append(track(&title));
                    reference.push_back(title);
                }
                Op::Pop => {
                    let got = queue.pop_front().map(|t| t.title);
                    prop_assert_eq!(got, reference.pop_front());
                }
                Op::Peek => {
                    let snapshot: Vec<String> = queue.peek_all().into_iter().map(|t| t.title).collect();
                    let expected: Vec<String> = reference.iter().cloned().collect();
                    prop_assert_eq!(snapshot, expected);
                }
            }
            prop_assert_eq!(queue.len(), reference.len());
        }
    }
}
