use askama::Template;
use forecast::ForecastOutput;
use history_model::{Interval, Period, Prediction, STOCKS, Stock};
use pulldown_cmark::{Options, Parser, html};
use serde::Deserialize;
use yahoo_api::StockData;

use crate::chart::LineChart;
use crate::predictions::StockPredictions;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum Page {
    #[default]
    Home,
    About,
    Statistics,
    Stocks,
}

impl Page {
    pub const ALL: [Page; 4] = [Page::Home, Page::About, Page::Statistics, Page::Stocks];

    pub fn as_str(&self) -> &'static str {
        match self {
            Page::Home => "Home",
            Page::About => "About",
            Page::Statistics => "Statistics",
            Page::Stocks => "Stocks",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum Model {
    #[default]
    #[serde(rename = "AUTOREG")]
    AutoReg,
    #[serde(rename = "LSTM")]
    Lstm,
    #[serde(rename = "RANDOM FOREST")]
    RandomForest,
}

impl Model {
    pub const ALL: [Model; 3] = [Model::AutoReg, Model::Lstm, Model::RandomForest];

    pub fn as_str(&self) -> &'static str {
        match self {
            Model::AutoReg => "AUTOREG",
            Model::Lstm => "LSTM",
            Model::RandomForest => "RANDOM FOREST",
        }
    }

    fn about(&self) -> &'static str {
        match self {
            Model::AutoReg => {
                "### About AUTOREG\n\
                 Autoregression (AR) is a representation of a type of random process; as such, \
                 it is used to describe certain time-varying processes in nature, economics, etc."
            }
            Model::Lstm => {
                "### About LSTM\n\
                 Long Short-Term Memory (LSTM) is an artificial recurrent neural network (RNN) \
                 architecture used in the field of deep learning. Unlike standard feedforward \
                 neural networks, LSTM has feedback connections."
            }
            Model::RandomForest => {
                "### About RANDOM FOREST\n\
                 Random Forest is a versatile machine learning method capable of performing both \
                 regression and classification tasks, as well as handling missing values and \
                 other complexities."
            }
        }
    }

    fn details(&self) -> &'static str {
        match self {
            Model::AutoReg => {
                "- **Lags**: closing prices of the previous trading days\n\
                 - **Estimation**: ordinary least squares with a constant term\n\
                 - **Differentiation Variable**: linear in its own past, no exogenous inputs"
            }
            Model::Lstm => {
                "- **Window**: sequence of past closing prices\n\
                 - **Layers**: recurrent cells with input, forget and output gates\n\
                 - **Differentiation Variable**: learns non-linear, long-range dependencies"
            }
            Model::RandomForest => {
                "- **Trees**: ensemble of decorrelated decision trees\n\
                 - **Features**: lagged prices and derived indicators\n\
                 - **Differentiation Variable**: averages many trees to reduce variance"
            }
        }
    }
}

/// One entry of a sidebar or form select.
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

fn select_options<T: Copy + PartialEq>(
    items: &[T],
    selected: T,
    value: impl Fn(T) -> String,
    label: impl Fn(T) -> String,
) -> Vec<SelectOption> {
    items
        .iter()
        .map(|&item| SelectOption {
            value: value(item),
            label: label(item),
            selected: item == selected,
        })
        .collect()
}

/// Widget state shared by every page: the sidebar selections.
pub struct Nav {
    pub page: Page,
    pub model: Model,
    /// Seconds until the browser reloads the page, 0 for never.
    pub refresh: u64,
}

impl Nav {
    pub fn new(page: Page, model: Model) -> Self {
        Nav {
            page,
            model,
            refresh: 0,
        }
    }

    pub fn refresh_label(&self) -> String {
        match self.refresh {
            0 => "on every visit".to_string(),
            1 => "every second".to_string(),
            60 => "every minute".to_string(),
            secs if secs % 60 == 0 => format!("every {} minutes", secs / 60),
            secs => format!("every {} seconds", secs),
        }
    }

    pub fn page_options(&self) -> Vec<SelectOption> {
        let name = |p: Page| p.as_str().to_string();
        select_options(&Page::ALL, self.page, name, name)
    }

    pub fn model_options(&self) -> Vec<SelectOption> {
        let name = |m: Model| m.as_str().to_string();
        select_options(&Model::ALL, self.model, name, name)
    }
}

pub struct Comparison {
    pub stock: &'static str,
    pub model: Model,
    pub accuracy: u8,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

const fn row(
    stock: &'static str,
    model: Model,
    accuracy: u8,
    precision: f64,
    recall: f64,
    f1: f64,
) -> Comparison {
    Comparison {
        stock,
        model,
        accuracy,
        precision,
        recall,
        f1,
    }
}

pub static COMPARISONS: [Comparison; 15] = [
    row("Apple", Model::AutoReg, 85, 0.80, 0.85, 0.82),
    row("Apple", Model::Lstm, 90, 0.88, 0.90, 0.89),
    row("Apple", Model::RandomForest, 88, 0.86, 0.88, 0.87),
    row("Amazon", Model::AutoReg, 80, 0.78, 0.80, 0.79),
    row("Amazon", Model::Lstm, 85, 0.84, 0.85, 0.84),
    row("Amazon", Model::RandomForest, 89, 0.88, 0.89, 0.88),
    row("Nvidia", Model::AutoReg, 82, 0.80, 0.82, 0.81),
    row("Nvidia", Model::Lstm, 88, 0.87, 0.88, 0.87),
    row("Nvidia", Model::RandomForest, 87, 0.85, 0.87, 0.86),
    row("Meta", Model::AutoReg, 78, 0.75, 0.78, 0.76),
    row("Meta", Model::Lstm, 84, 0.83, 0.84, 0.83),
    row("Meta", Model::RandomForest, 86, 0.85, 0.86, 0.85),
    row("Netflix", Model::AutoReg, 81, 0.80, 0.81, 0.80),
    row("Netflix", Model::Lstm, 86, 0.85, 0.86, 0.85),
    row("Netflix", Model::RandomForest, 90, 0.88, 0.90, 0.89),
];

/// Convert markdown text to HTML
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);

    let parser = Parser::new_ext(markdown, options);
    let mut html_output = String::new();
    html::push_html(&mut html_output, parser);

    html_output
}

#[derive(Template)]
#[template(path = "home.html")]
struct HomeTemplate<'a> {
    nav: Nav,
    predictions: &'a [StockPredictions],
}

#[derive(Template)]
#[template(path = "about.html")]
struct AboutTemplate {
    nav: Nav,
    about_html: String,
}

#[derive(Template)]
#[template(path = "statistics.html")]
struct StatisticsTemplate {
    nav: Nav,
    comparisons: &'static [Comparison],
    details_html: String,
}

pub struct InfoRow {
    pub label: &'static str,
    pub value: String,
}

#[derive(Template)]
#[template(path = "stocks.html")]
struct StocksTemplate<'a> {
    nav: Nav,
    ticker: &'a str,
    name: &'a str,
    ticker_options: Vec<SelectOption>,
    period_options: Vec<SelectOption>,
    interval_options: Vec<SelectOption>,
    info_rows: Vec<InfoRow>,
    history_chart: String,
    forecast_chart: String,
    prediction: Prediction,
    coefficients: String,
    observations: usize,
}

pub fn home(
    mut nav: Nav,
    refresh_secs: u64,
    predictions: &[StockPredictions],
) -> askama::Result<String> {
    nav.refresh = refresh_secs;
    HomeTemplate { nav, predictions }.render()
}

pub fn about(nav: Nav) -> askama::Result<String> {
    let about_html = markdown_to_html(nav.model.about());
    AboutTemplate { nav, about_html }.render()
}

pub fn statistics(nav: Nav) -> askama::Result<String> {
    let details_html = markdown_to_html(nav.model.details());
    StatisticsTemplate {
        nav,
        comparisons: &COMPARISONS,
        details_html,
    }
    .render()
}

pub fn stocks(
    nav: Nav,
    ticker: &str,
    period: Period,
    interval: Interval,
    data: &StockData,
    output: &ForecastOutput,
) -> askama::Result<String> {
    let history_chart = LineChart::new(format!("{} close ({}, {})", ticker, period, interval))
        .series(
            "close",
            "steelblue",
            data.history.iter().map(|e| (e.date, e.close)),
        )
        .render();

    let points = |series: &[forecast::Point]| {
        series
            .iter()
            .map(|p| (p.date, p.value))
            .collect::<Vec<_>>()
    };
    let forecast_chart = LineChart::new(format!("{} autoregressive forecast", ticker))
        .series("train", "steelblue", points(&output.train))
        .series("test", "seagreen", points(&output.test))
        .series("predictions", "darkorange", points(&output.predictions))
        .series("forecast", "crimson", points(&output.forecast))
        .render();

    let coefficients = std::iter::once(format!("c = {:.4}", output.model.intercept()))
        .chain(
            output
                .model
                .coefficients()
                .iter()
                .enumerate()
                .map(|(i, phi)| format!("φ{} = {:.4}", i + 1, phi)),
        )
        .collect::<Vec<_>>()
        .join(", ");

    let mut ticker_options = select_options(
        &STOCKS,
        Stock::by_symbol(ticker).copied().unwrap_or(STOCKS[0]),
        |s| s.symbol.to_string(),
        |s| format!("{} ({})", s.name, s.symbol),
    );
    if Stock::by_symbol(ticker).is_none() {
        // free-form symbol typed into the query string
        for option in &mut ticker_options {
            option.selected = false;
        }
        ticker_options.push(SelectOption {
            value: ticker.to_string(),
            label: ticker.to_string(),
            selected: true,
        });
    }

    StocksTemplate {
        nav,
        ticker,
        name: data.info.name(),
        ticker_options,
        period_options: select_options(
            &Period::ALL,
            period,
            |p| p.to_string(),
            |p| p.to_string(),
        ),
        interval_options: select_options(
            &Interval::ALL,
            interval,
            |i| i.to_string(),
            |i| i.to_string(),
        ),
        info_rows: data
            .info
            .rows()
            .into_iter()
            .map(|(label, value)| InfoRow { label, value })
            .collect(),
        history_chart,
        forecast_chart,
        prediction: output.prediction,
        coefficients,
        observations: output.train.len() + output.test.len(),
    }
    .render()
}
