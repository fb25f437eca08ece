//! Shared test fixtures / 测试数据

use crate::models::Figure;
use super::projector::FigureSummary;
use super::query::UserId;

pub fn figure(id: &str, owner: &UserId, manufacturer: &str, name: &str) -> Figure {
    Figure {
        id: id.to_string(),
        user_id: owner.to_string(),
        manufacturer: manufacturer.to_string(),
        name: name.to_string(),
        scale: "1/7".to_string(),
        link: format!("https://example.com/figure/{}", id),
        location: "Living room".to_string(),
        box_number: format!("BOX-{}", id),
        image: None,
        created_at: "2024-01-01T00:00:00+00:00".to_string(),
        updated_at: "2024-01-01T00:00:00+00:00".to_string(),
    }
}

/// Two users with overlapping collections / 两个用户的重叠收藏
pub fn collection(alice: &UserId, bob: &UserId) -> Vec<Figure> {
    let mut shelf = figure("a3", alice, "Good Smile Company", "Nendoroid Rem");
    shelf.location = "Shelf".to_string();
    let mut boxed = figure("a4", alice, "Goodies", "Saber Alter");
    boxed.location = "Closet".to_string();
    boxed.box_number = "Smile crate".to_string();
    vec![
        figure("a1", alice, "Good Smile Company", "Hatsune Miku"),
        figure("a2", alice, "Kotobukiya", "Mikasa Ackerman"),
        shelf,
        boxed,
        figure("a5", alice, "Max Factory", "figma a.b*c( edition"),
        figure("a6", alice, "Banpresto", "Good Boy Figure"),
        figure("b1", bob, "Good Smile Company", "Hatsune Miku"),
        figure("b2", bob, "Kotobukiya", "Mikasa Ackerman"),
    ]
}

pub fn figure_ids(figures: &[Figure]) -> Vec<String> {
    figures.iter().map(|f| f.id.clone()).collect()
}

pub fn summary_ids(summaries: &[FigureSummary]) -> Vec<String> {
    summaries.iter().map(|f| f.id.clone()).collect()
}
