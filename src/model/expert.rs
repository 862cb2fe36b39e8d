use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Expert {
    pub id: u32,
    pub name: String,
    pub specialty: String,
    pub rating: f64,
    pub reviews: u32,
    pub success_rate: u32,
    pub avatar: String,
}

impl Expert {
    fn new(
        id: u32,
        name: &str,
        specialty: &str,
        rating: f64,
        reviews: u32,
        success_rate: u32,
        avatar: &str,
    ) -> Self {
        Self {
            id,
            name: name.to_string(),
            specialty: specialty.to_string(),
            rating,
            reviews,
            success_rate,
            avatar: avatar.to_string(),
        }
    }
}

pub fn default_roster() -> Vec<Expert> {
    vec![
        Expert::new(1, "Mark Johnson", "Stock Market Analyst", 4.9, 128, 78, "MJ"),
        Expert::new(2, "Sarah Chen", "Forex Specialist", 4.7, 94, 82, "SC"),
        Expert::new(3, "Michael Torres", "Cryptocurrency Expert", 4.5, 156, 71, "MT"),
        Expert::new(4, "Emily Watson", "Technical Analyst", 4.8, 89, 75, "EW"),
    ]
}
