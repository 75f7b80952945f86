use crate::core::context::ScanContext;
use crate::domain::model::{Good, ShoppingListEntry};
use crate::domain::ports::GoodStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    /// 可購買；`good` 的價格已改成總價、數量改成購買量
    Eligible { quantity: u64, total: u64 },
    Shortfall { required: u64, available: u64 },
    NotInList,
}

impl MatchOutcome {
    pub fn is_eligible(&self) -> bool {
        matches!(self, MatchOutcome::Eligible { .. })
    }
}

pub struct GoodMatcher;

impl GoodMatcher {
    /// 以名稱完全比對購物清單。清單中同名項目取第一個數量足夠的。
    pub fn evaluate(good: &mut Good, shopping_list: &[ShoppingListEntry]) -> MatchOutcome {
        let mut shortfall = None;

        for entry in shopping_list.iter().filter(|e| e.item == good.name) {
            if entry.quantity <= good.quantity {
                let total = entry.quantity.saturating_mul(good.price());
                good.set_price(total);
                good.quantity = entry.quantity;
                return MatchOutcome::Eligible {
                    quantity: entry.quantity,
                    total,
                };
            }
            if shortfall.is_none() {
                shortfall = Some(MatchOutcome::Shortfall {
                    required: entry.quantity,
                    available: good.quantity,
                });
            }
        }

        shortfall.unwrap_or(MatchOutcome::NotInList)
    }

    /// 比對並寫一筆活動日誌
    pub fn run<S: GoodStore>(
        ctx: &ScanContext<S>,
        good: &mut Good,
        shop: &str,
        category: &str,
    ) -> MatchOutcome {
        let outcome = Self::evaluate(good, &ctx.client().shopping_list);

        let message = match outcome {
            MatchOutcome::Eligible { quantity, total } => format!(
                "Processed good {} with total price {} for amount {}",
                good.name, total, quantity
            ),
            MatchOutcome::Shortfall {
                required,
                available,
            } => format!(
                "Not enough entity for good {}. Required: {}, Available: {}",
                good.name, required, available
            ),
            MatchOutcome::NotInList => {
                format!("Good {} not in client's shopping list", good.name)
            }
        };
        ctx.log_category(message, shop, category);

        outcome
    }
}
