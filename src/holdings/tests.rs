use super::*;

#[test]
fn bonus_card_catalog_has_nine_distinct_cards() {
    let cards = bonus_card_catalog();
    assert_eq!(cards.len(), 9);
    let unique: std::collections::HashSet<_> = cards.iter().map(|c| c.id).collect();
    assert_eq!(unique.len(), 9);
}

#[test]
fn favor_tile_catalog_names_round_trip() {
    for tile in favor_tile_catalog() {
        assert!(!tile.id.name().is_empty());
    }
}

#[test]
fn scoring_tile_catalog_has_six_tiles_one_per_round() {
    assert_eq!(scoring_tile_catalog().len(), 6);
}

#[test]
fn only_one_scoring_tile_uses_the_temple_priest_special_case() {
    let count = scoring_tile_catalog()
        .iter()
        .filter(|t| t.temple_priest_special_case)
        .count();
    assert_eq!(count, 1);
}

#[test]
fn town_tile_5_points_matches_scenario_rewards() {
    let tile = town_tile_catalog()
        .into_iter()
        .find(|t| t.id == TownTileId::TownTile5Points)
        .unwrap();
    assert_eq!(tile.victory_points, 5);
    assert_eq!(tile.coins, 6);
    assert!(tile.grants_key);
}
