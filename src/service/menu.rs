use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::instrument;

use crate::billing::money::{checked_sum, validate_charge};
use crate::billing::period::BillingPeriod;
use crate::error::{AppError, AppResult};
use crate::model::daily_menu::{DailyMenu, MealItem, MenuChanges, NewMenu};
use crate::repository::MenuStore;

fn validate_fixed_charge(fixed_charge: Decimal) -> AppResult<()> {
    validate_charge("Fixed charge", fixed_charge)
}

/// Trims names and checks each price, then the day's total, against the
/// daily column bounds.
fn validate_meals(meals: &[MealItem]) -> AppResult<Vec<MealItem>> {
    let meals = meals
        .iter()
        .enumerate()
        .map(|(i, meal)| -> AppResult<MealItem> {
            let name = meal.name.trim();
            if name.is_empty() {
                return Err(AppError::invalid(format!("Meal #{} has no name", i + 1)));
            }
            validate_charge(&format!("Price of meal '{name}'"), meal.price)?;
            Ok(MealItem {
                name: name.to_string(),
                ..meal.clone()
            })
        })
        .collect::<AppResult<Vec<_>>>()?;

    let total = checked_sum("Total meal price", meals.iter().map(|meal| meal.price))?;
    validate_charge("Total meal price", total)?;
    Ok(meals)
}

#[instrument(skip(store, meals))]
pub async fn create_menu<S: MenuStore>(
    store: &S,
    date: NaiveDate,
    fixed_charge: Option<Decimal>,
    meals: &[MealItem],
    default_fixed_charge: Decimal,
) -> AppResult<DailyMenu> {
    let fixed_charge = fixed_charge.unwrap_or(default_fixed_charge);
    validate_fixed_charge(fixed_charge)?;
    let meals = validate_meals(meals)?;

    let menu = store
        .insert_menu(&NewMenu {
            date,
            fixed_charge,
            meals,
        })
        .await
        .map_err(|e| match e {
            AppError::Conflict { .. } => {
                AppError::conflict(format!("A menu for {date} already exists"))
            }
            other => other,
        })?;

    tracing::info!(menu_id = menu.id, "Menu created");
    Ok(menu)
}

#[instrument(skip(store, changes))]
pub async fn update_menu<S: MenuStore>(
    store: &S,
    id: u64,
    changes: MenuChanges,
) -> AppResult<DailyMenu> {
    if changes == MenuChanges::default() {
        return Err(AppError::invalid("No fields provided for update"));
    }
    if let Some(fixed_charge) = changes.fixed_charge {
        validate_fixed_charge(fixed_charge)?;
    }
    let changes = MenuChanges {
        meals: changes.meals.as_deref().map(validate_meals).transpose()?,
        ..changes
    };

    store
        .update_menu(id, &changes)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Menu {id} not found")))
}

pub async fn get_menu<S: MenuStore>(store: &S, id: u64) -> AppResult<DailyMenu> {
    store
        .find_menu(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Menu {id} not found")))
}

pub async fn menu_on<S: MenuStore>(store: &S, date: NaiveDate) -> AppResult<DailyMenu> {
    store
        .find_menu_by_date(date)
        .await?
        .ok_or_else(|| AppError::not_found(format!("No menu for {date}")))
}

pub async fn menus_in_range<S: MenuStore>(
    store: &S,
    start: NaiveDate,
    end: NaiveDate,
) -> AppResult<Vec<DailyMenu>> {
    let period = BillingPeriod::new(start, end)?;
    store.menus_in_range(period.start(), period.end()).await
}

#[instrument(skip(store))]
pub async fn delete_menu<S: MenuStore>(store: &S, id: u64) -> AppResult<()> {
    if !store.delete_menu(id).await? {
        return Err(AppError::not_found(format!("Menu {id} not found")));
    }
    tracing::info!(menu_id = id, "Menu deleted");
    Ok(())
}
