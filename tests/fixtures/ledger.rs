use std::collections::HashMap;

pub trait Store {
    fn total(&self) -> i64;
}

pub struct Ledger {
    entries: HashMap<String, i64>,
}

impl Ledger {
    pub fn new() -> Self {
        Self { entries: HashMap::new() }
    }

    pub fn credit(&mut self, who: &str, amount: i64) {
        let balance = self.entries.entry(who.to_string()).or_insert(0);
        *balance += amount;
    }

    pub fn debit(&mut self, who: &str, amount: i64) {
        let balance = self.entries.entry(who.to_string()).or_insert(0);
        *balance -= amount;
    }
}

impl Store for Ledger {
    fn total(&self) -> i64 {
        self.entries.values().sum()
    }
}

pub mod audit {
    pub fn check(total: i64) -> bool {
        total >= 0
    }
}
