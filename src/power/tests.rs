use super::*;

#[test]
fn starting_distributes_remainder_into_bowl3() {
    let power = PowerSystem::starting(5, 7);
    assert_eq!(power.bowl1, 5);
    assert_eq!(power.bowl2, 7);
    assert_eq!(power.bowl3, 0);
    assert_eq!(power.total(), TOTAL_TOKENS);
}

#[test]
fn gain_prefers_bowl2_to_bowl3_over_bowl1_to_bowl2() {
    let mut power = PowerSystem::starting(5, 7);
    let advanced = power.gain(3);
    assert_eq!(advanced, 3);
    assert_eq!(power.bowl2, 4);
    assert_eq!(power.bowl3, 3);
}

#[test]
fn gain_caps_at_available_tokens() {
    let mut power = PowerSystem {
        bowl1: 0,
        bowl2: 2,
        bowl3: 10,
    };
    let advanced = power.gain(5);
    assert_eq!(advanced, 2);
    assert_eq!(power.bowl3, 12);
    assert_eq!(power.total(), TOTAL_TOKENS);
}

#[test]
fn spend_moves_tokens_back_to_bowl1() {
    let mut power = PowerSystem {
        bowl1: 0,
        bowl2: 0,
        bowl3: 12,
    };
    power.spend(4).unwrap();
    assert_eq!(power.bowl3, 8);
    assert_eq!(power.bowl1, 4);
}

#[test]
fn spend_more_than_available_is_an_error() {
    let mut power = PowerSystem::starting(12, 0);
    let err = power.spend(1).unwrap_err();
    assert!(matches!(
        err,
        crate::error::EngineError::InsufficientResources { .. }
    ));
}

#[test]
fn burn_converts_two_bowl2_into_one_bowl3() {
    let mut power = PowerSystem::starting(0, 12);
    power.burn(3).unwrap();
    assert_eq!(power.bowl2, 6);
    assert_eq!(power.bowl3, 3);
}

#[test]
fn burn_fails_without_enough_bowl2_tokens() {
    let mut power = PowerSystem::starting(0, 1);
    assert!(power.burn(1).is_err());
}

#[test]
fn max_leechable_caps_at_bowl1_plus_bowl2() {
    let power = PowerSystem::starting(1, 2);
    assert_eq!(power.max_leechable(5), 3);
    assert_eq!(power.max_leechable(2), 2);
}
