use crate::domain::model::{Client, ShoppingListEntry};
use crate::utils::error::{Result, ScanError};
use std::io::{BufRead, Write};

const END_MARKER: &str = "end";

/// 互動式輸入：提示寫到 `output`，回答從 `input` 讀取
pub struct ClientReader<R: BufRead, W: Write> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> ClientReader<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn read_client_count(&mut self) -> Result<usize> {
        let line = self.prompt("Enter number of clients: ")?;
        line.trim().parse().map_err(|_| ScanError::InputError {
            message: format!("Invalid client count: '{}'", line.trim()),
        })
    }

    pub fn read_clients(&mut self) -> Result<Vec<Client>> {
        let count = self.read_client_count()?;
        let mut clients = Vec::new();
        for i in 0..count {
            writeln!(self.output, "\nClient {}:", i + 1)?;
            clients.push(self.read_client()?);
        }
        Ok(clients)
    }

    /// 讀取一位顧客：名稱、`<item> <quantity>` 清單直到 `end`、可選的價格上限
    pub fn read_client(&mut self) -> Result<Client> {
        let name = self.prompt("Enter user name: ")?.trim().to_string();
        if name.is_empty() {
            return Err(ScanError::InputError {
                message: "User name cannot be empty".to_string(),
            });
        }
        let mut client = Client::new(name);

        writeln!(
            self.output,
            "Enter shopping list (format: item amount) and type '{}' to finish:",
            END_MARKER
        )?;
        loop {
            let line = self.prompt(&format!("Item {}: ", client.shopping_list.len() + 1))?;
            let line = line.trim();
            if line == END_MARKER {
                break;
            }
            if line.is_empty() {
                continue;
            }
            match parse_entry(line) {
                Some(entry) => client.shopping_list.push(entry),
                None => {
                    writeln!(self.output, "Expected '<item> <amount>', got '{}'", line)?;
                }
            }
        }

        let line = self.prompt("Enter price threshold (or press Enter to skip): ")?;
        let line = line.trim();
        if !line.is_empty() {
            let threshold = line.parse().map_err(|_| ScanError::InputError {
                message: format!("Invalid price threshold: '{}'", line),
            })?;
            client.price_threshold = Some(threshold);
        }

        Ok(client)
    }

    /// 空白輸入代表不評分
    pub fn read_rating(&mut self, good_name: &str) -> Result<Option<f32>> {
        let line = self.prompt(&format!("Please rate the good {} (0 to 5): ", good_name))?;
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        line.parse().map(Some).map_err(|_| ScanError::InputError {
            message: format!("Invalid rating: '{}'", line),
        })
    }

    fn prompt(&mut self, text: &str) -> Result<String> {
        write!(self.output, "{}", text)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(ScanError::InputError {
                message: "Unexpected end of input".to_string(),
            });
        }
        Ok(line)
    }
}

fn parse_entry(line: &str) -> Option<ShoppingListEntry> {
    let mut parts = line.split_whitespace();
    let item = parts.next()?;
    let quantity = parts.next()?.parse().ok()?;
    Some(ShoppingListEntry::new(item, quantity))
}
