//! 商品記錄檔的文字格式，一行一個 `Key: value`。
//!
//! ```text
//! Name: lamp
//! Price: 100
//! Score: 4.00
//! Entity: 5
//! Last Modified: 2024-05-01T10:00:00
//! ```
//!
//! `Score` 欄位存的是評分 (rating)，不是計算後的 score。

use crate::domain::model::Good;
use std::str::FromStr;

const NAME: &str = "Name:";
const PRICE: &str = "Price:";
const RATING: &str = "Score:";
const QUANTITY: &str = "Entity:";
const LAST_MODIFIED: &str = "Last Modified:";

/// 解析記錄內容。無法辨識的行會被忽略，缺少或無法解析的欄位保持零值。
pub fn parse_good(content: &str) -> Good {
    let mut good = Good::default();

    for line in content.lines() {
        let line = line.trim_start();
        if let Some(rest) = line.strip_prefix(NAME) {
            if let Some(token) = first_token(rest) {
                good.name = token.to_string();
            }
        } else if let Some(rest) = line.strip_prefix(PRICE) {
            good.set_price(parse_or_default(rest));
        } else if let Some(rest) = line.strip_prefix(RATING) {
            good.set_rating(parse_or_default(rest));
        } else if let Some(rest) = line.strip_prefix(QUANTITY) {
            good.quantity = parse_or_default(rest);
        } else if let Some(rest) = line.strip_prefix(LAST_MODIFIED) {
            if let Some(token) = first_token(rest) {
                good.last_modified = token.to_string();
            }
        }
    }

    good
}

pub fn format_good(good: &Good) -> String {
    format!(
        "{} {}\n{} {}\n{} {:.2}\n{} {}\n{} {}\n",
        NAME,
        good.name,
        PRICE,
        good.price(),
        RATING,
        good.rating(),
        QUANTITY,
        good.quantity,
        LAST_MODIFIED,
        good.last_modified
    )
}

fn first_token(rest: &str) -> Option<&str> {
    rest.split_whitespace().next()
}

fn parse_or_default<T: FromStr + Default>(rest: &str) -> T {
    first_token(rest)
        .and_then(|token| token.parse().ok())
        .unwrap_or_default()
}
