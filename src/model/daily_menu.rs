use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use utoipa::ToSchema;

use crate::billing::money::checked_sum;
use crate::error::AppResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MealItem {
    #[schema(example = "Chicken Biryani")]
    pub name: String,

    #[schema(example = "Lunch")]
    pub meal_type: MealType,

    #[schema(example = "50.00")]
    pub price: Decimal,
}

/// Everything chargeable on one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "date": "2025-01-01",
        "fixed_charge": "20.00",
        "meals": [
            { "name": "Paratha", "meal_type": "Breakfast", "price": "25.00" },
            { "name": "Chicken Biryani", "meal_type": "Lunch", "price": "50.00" }
        ],
        "created_at": "2024-12-31T18:00:00",
        "updated_at": null
    })
)]
pub struct DailyMenu {
    pub id: u64,
    pub date: NaiveDate,
    pub fixed_charge: Decimal,
    pub meals: Vec<MealItem>,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

impl DailyMenu {
    /// Sum of every meal price for the day.
    pub fn food_cost(&self) -> AppResult<Decimal> {
        checked_sum(
            &format!("Food cost for {}", self.date),
            self.meals.iter().map(|meal| meal.price),
        )
    }
}

/// Row shape of `daily_menus`; meals live in a JSON column.
#[derive(sqlx::FromRow)]
pub struct DailyMenuRow {
    pub id: u64,
    pub date: NaiveDate,
    pub fixed_charge: Decimal,
    pub meals: Json<Vec<MealItem>>,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

impl From<DailyMenuRow> for DailyMenu {
    fn from(row: DailyMenuRow) -> Self {
        DailyMenu {
            id: row.id,
            date: row.date,
            fixed_charge: row.fixed_charge,
            meals: row.meals.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewMenu {
    pub date: NaiveDate,
    pub fixed_charge: Decimal,
    pub meals: Vec<MealItem>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MenuChanges {
    pub fixed_charge: Option<Decimal>,
    pub meals: Option<Vec<MealItem>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn food_cost_sums_meal_prices() {
        let menu = DailyMenu {
            id: 1,
            date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            fixed_charge: dec!(20),
            meals: vec![
                MealItem {
                    name: "Paratha".into(),
                    meal_type: MealType::Breakfast,
                    price: dec!(25.50),
                },
                MealItem {
                    name: "Dal".into(),
                    meal_type: MealType::Dinner,
                    price: dec!(30),
                },
            ],
            created_at: NaiveDate::from_ymd_opt(2025, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            updated_at: None,
        };

        assert_eq!(menu.food_cost().unwrap(), dec!(55.50));
    }

    #[test]
    fn meal_price_accepts_json_numbers_and_strings() {
        let from_number: MealItem =
            serde_json::from_str(r#"{"name":"Tea","meal_type":"Breakfast","price":12.5}"#)
                .unwrap();
        let from_string: MealItem =
            serde_json::from_str(r#"{"name":"Tea","meal_type":"Breakfast","price":"12.5"}"#)
                .unwrap();
        assert_eq!(from_number.price, dec!(12.5));
        assert_eq!(from_string.price, dec!(12.5));
    }
}
