/// A tradable instrument shown on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stock {
    pub name: &'static str,
    pub symbol: &'static str,
}

pub static STOCKS: [Stock; 5] = [
    Stock {
        name: "Apple",
        symbol: "AAPL",
    },
    Stock {
        name: "Amazon",
        symbol: "AMZN",
    },
    Stock {
        name: "Nvidia",
        symbol: "NVDA",
    },
    Stock {
        name: "Meta",
        symbol: "META",
    },
    Stock {
        name: "Netflix",
        symbol: "NFLX",
    },
];

impl Stock {
    pub fn by_symbol(symbol: &str) -> Option<&'static Stock> {
        STOCKS.iter().find(|s| s.symbol.eq_ignore_ascii_case(symbol))
    }
}
