use giftring_core::{compute_assignment, Assignment, AssignmentError, AssignmentStrategy};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;

fn assert_valid<T: Clone + Eq + std::hash::Hash + std::fmt::Debug>(
    assignment: &Assignment<T>,
    participants: &[T],
) {
    assert_eq!(assignment.len(), participants.len());
    let givers: HashSet<&T> = assignment.iter().map(|(giver, _)| giver).collect();
    let recipients: HashSet<&T> = assignment.iter().map(|(_, recipient)| recipient).collect();
    let expected: HashSet<&T> = participants.iter().collect();
    assert_eq!(givers, expected);
    assert_eq!(recipients, expected);
    for (giver, recipient) in assignment.iter() {
        assert_ne!(giver, recipient, "{giver:?} drew themself");
    }
    assert!(assignment.is_derangement_of(participants));
}

#[test]
fn three_participants_form_one_of_two_three_cycles() {
    let participants = ["A", "B", "C"];
    let clockwise = [("A", "B"), ("B", "C"), ("C", "A")];
    let counter = [("A", "C"), ("B", "A"), ("C", "B")];

    let mut seen = HashSet::new();
    for seed in 0..64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let assignment =
            compute_assignment(&participants, AssignmentStrategy::RandomCycle, &mut rng).unwrap();
        assert_valid(&assignment, &participants);

        let pairs = assignment.into_pairs();
        assert!(pairs == clockwise || pairs == counter, "unexpected {pairs:?}");
        seen.insert(pairs);
    }
    assert_eq!(seen.len(), 2, "both 3-cycles should show up over 64 seeds");
}

#[test]
fn two_participants_are_rejected() {
    let mut rng = StdRng::seed_from_u64(1);
    for strategy in [AssignmentStrategy::RandomCycle, AssignmentStrategy::greedy()] {
        let err = compute_assignment(&["A", "B"], strategy, &mut rng).unwrap_err();
        assert_eq!(err, AssignmentError::InsufficientParticipants { count: 2 });
    }
}

#[test]
fn failure_on_tiny_input_is_repeatable() {
    let mut rng = StdRng::seed_from_u64(2);
    let single = ["solo"];
    for _ in 0..10 {
        assert_eq!(
            compute_assignment(&single, AssignmentStrategy::RandomCycle, &mut rng),
            Err(AssignmentError::InsufficientParticipants { count: 1 })
        );
        assert_eq!(
            compute_assignment::<&str, _>(&[], AssignmentStrategy::greedy(), &mut rng),
            Err(AssignmentError::InsufficientParticipants { count: 0 })
        );
    }
}

#[test]
fn five_participants_over_a_thousand_seeds_stay_valid_and_vary() {
    let participants = ["A", "B", "C", "D", "E"];
    for strategy in [AssignmentStrategy::RandomCycle, AssignmentStrategy::greedy()] {
        let mut distinct = HashSet::new();
        for seed in 0..1000 {
            let mut rng = StdRng::seed_from_u64(seed);
            let assignment = compute_assignment(&participants, strategy, &mut rng).unwrap();
            assert_valid(&assignment, &participants);
            distinct.insert(assignment.into_pairs());
        }
        assert!(
            distinct.len() > 1,
            "{} produced a single mapping",
            strategy.as_str()
        );
    }
}

#[test]
fn different_seeds_usually_produce_different_mappings() {
    let participants = [1u32, 2, 3, 4];
    let mut differing = 0;
    let trials = 200;
    for seed in 0..trials {
        let mut left = StdRng::seed_from_u64(seed);
        let mut right = StdRng::seed_from_u64(seed + 10_000);
        let a = compute_assignment(&participants, AssignmentStrategy::RandomCycle, &mut left)
            .unwrap();
        let b = compute_assignment(&participants, AssignmentStrategy::RandomCycle, &mut right)
            .unwrap();
        if a != b {
            differing += 1;
        }
    }
    // Six 4-cycles exist, so independent draws match about 1 time in 6.
    assert!(differing > trials / 2, "only {differing} of {trials} differed");
}

#[test]
fn random_cycle_never_exhausts_across_sizes() {
    let mut rng = StdRng::seed_from_u64(99);
    for n in 3..=64u32 {
        let participants: Vec<u32> = (0..n).collect();
        for _ in 0..20 {
            let assignment =
                compute_assignment(&participants, AssignmentStrategy::RandomCycle, &mut rng)
                    .expect("random cycle must not fail for n >= 3");
            assert_valid(&assignment, &participants);
        }
    }
}

#[test]
fn greedy_with_single_attempt_either_succeeds_validly_or_exhausts() {
    let participants = ["A", "B", "C"];
    let mut successes = 0;
    let mut exhausted = 0;
    for seed in 0..300 {
        let mut rng = StdRng::seed_from_u64(seed);
        match compute_assignment(
            &participants,
            AssignmentStrategy::GreedyWithRetry { max_attempts: 1 },
            &mut rng,
        ) {
            Ok(assignment) => {
                assert_valid(&assignment, &participants);
                successes += 1;
            }
            Err(err) => {
                assert_eq!(err, AssignmentError::AssignmentExhausted { attempts: 1 });
                exhausted += 1;
            }
        }
    }
    assert!(successes > 0);
    assert!(exhausted > 0, "a single greedy pass over 3 should dead-end sometimes");
}

#[test]
fn same_seed_reproduces_the_same_mapping() {
    let participants = ["ann", "bob", "cid", "dee", "eve", "fay"];
    let first = compute_assignment(
        &participants,
        AssignmentStrategy::RandomCycle,
        &mut StdRng::seed_from_u64(2024),
    )
    .unwrap();
    let second = compute_assignment(
        &participants,
        AssignmentStrategy::RandomCycle,
        &mut StdRng::seed_from_u64(2024),
    )
    .unwrap();
    assert_eq!(first, second);
}
