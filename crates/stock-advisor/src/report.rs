//! Report Rendering
//!
//! Turns analysis results into transport-neutral payloads: an embed-like
//! structure (title, fields, footer, tone) plus the raw chart data a
//! front-end needs to draw its image.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::model::{
    DcaSimulation, HistoryPeriod, MarketMover, MarketOverview, NewsItem, PriceSeries,
    QuoteSnapshot, ReturnSeries, RiskSummary,
};
use crate::translate::truncate_chars;

/// Histogram resolution for return distributions
pub const HISTOGRAM_BINS: usize = 50;

pub const NEWS_TITLE_MAX: usize = 250;
pub const NEWS_SUMMARY_MAX: usize = 200;

const NOT_AVAILABLE: &str = "N/A";

/// Overall sentiment of a report, mapped to a color by the front-end
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Positive,
    Negative,
    Neutral,
    Info,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// Line chart series
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineSeries {
    pub label: String,
    pub points: Vec<(NaiveDate, f64)>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Vertical reference line on a histogram
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub label: String,
    pub value: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartSpec {
    Lines {
        title: String,
        series: Vec<LineSeries>,
    },
    Histogram {
        title: String,
        bins: Vec<HistogramBin>,
        markers: Vec<Marker>,
    },
}

/// Display payload produced for every command
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RenderPayload {
    pub title: String,
    pub description: Option<String>,
    pub fields: Vec<EmbedField>,
    pub footer: Option<String>,
    pub tone: Tone,
    pub thumbnail_url: Option<String>,
    pub chart: Option<ChartSpec>,
}

impl RenderPayload {
    pub fn new(title: impl Into<String>, tone: Tone) -> Self {
        Self {
            title: title.into(),
            description: None,
            fields: Vec::new(),
            footer: None,
            tone,
            thumbnail_url: None,
            chart: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    #[must_use]
    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    #[must_use]
    pub fn with_chart(mut self, chart: ChartSpec) -> Self {
        self.chart = Some(chart);
        self
    }

    /// Plain-text rendering for transports without rich embeds
    pub fn to_text(&self) -> String {
        let mut out = format!("**{}**\n", self.title);

        if let Some(description) = &self.description {
            out.push_str(description);
            out.push('\n');
        }

        for field in &self.fields {
            out.push('\n');
            out.push_str(&field.name);
            out.push('\n');
            out.push_str(&field.value);
            out.push('\n');
        }

        if let Some(footer) = &self.footer {
            out.push('\n');
            out.push_str(footer);
            out.push('\n');
        }

        out
    }
}

pub fn dca_report(sim: &DcaSimulation, prices: &PriceSeries, period_months: u32) -> RenderPayload {
    let s = &sim.summary;
    let tone = if s.is_profitable() {
        Tone::Positive
    } else {
        Tone::Negative
    };

    let roi = s
        .roi_percent
        .map_or_else(|| NOT_AVAILABLE.to_string(), |r| format!("{:.2}%", r.round_dp(2)));
    let avg_cost = s
        .avg_cost_per_share
        .map_or_else(|| NOT_AVAILABLE.to_string(), money);

    let mut payload = RenderPayload::new(format!("DCA Analysis: {}", sim.symbol), tone)
        .with_description(format!(
            "Simulated {} contributions of **{}** over **{period_months} months**",
            sim.frequency,
            money(sim.amount)
        ))
        .field(
            "💰 Investment",
            format!(
                "Total invested: `{}`\nContributions: `{}`\nPeriod: `{period_months} months`",
                money(s.total_invested),
                s.contributions
            ),
            true,
        )
        .field(
            "📊 DCA Result",
            format!(
                "Portfolio value: `{}`\nProfit/Loss: `{}`\n**ROI: `{roi}`**",
                money(s.final_value),
                money(s.profit_loss)
            ),
            true,
        )
        .field(
            "📈 Stats & Price",
            format!(
                "Average cost: `{avg_cost}`\nCurrent price: `{}` ({})\nShares held: `{:.4}`",
                money(s.final_price),
                s.final_date,
                s.total_shares.round_dp(4)
            ),
            false,
        );

    if sim.skipped > 0 {
        payload = payload.with_footer(format!(
            "{} scheduled contribution(s) fell after the last trading day and were skipped",
            sim.skipped
        ));
    }

    let portfolio = LineSeries {
        label: "Portfolio Value".to_string(),
        points: sim
            .events
            .iter()
            .map(|e| (e.trade_date, to_f64(e.portfolio_value)))
            .collect(),
    };
    let price = LineSeries {
        label: format!("{} Price", sim.symbol),
        points: prices
            .valid_points()
            .map(|(p, close)| (p.date(), close))
            .collect(),
    };

    payload.with_chart(ChartSpec::Lines {
        title: format!("DCA Portfolio Value vs. {} Price", sim.symbol),
        series: vec![portfolio, price],
    })
}

pub fn risk_report(
    symbol: &str,
    period: HistoryPeriod,
    prices: &PriceSeries,
    returns: &ReturnSeries,
    risk: &RiskSummary,
) -> RenderPayload {
    let confidence_pct = risk.confidence * 100.0;
    let last_close = prices
        .last_valid()
        .map_or_else(|| NOT_AVAILABLE.to_string(), |(_, c)| money_f64(c));
    let mean_close = prices
        .mean_close()
        .map_or_else(|| NOT_AVAILABLE.to_string(), money_f64);

    let moment = |v: Option<f64>| v.map_or_else(|| "undefined".to_string(), |x| format!("{x:.3}"));
    let shortfall = risk
        .expected_shortfall
        .map_or_else(|| "undefined".to_string(), percent);

    RenderPayload::new(format!("Probability Analysis: {symbol}"), Tone::Info)
        .with_description(format!(
            "Based on **{period}** of history (`{}` trading days)",
            risk.observations
        ))
        .field(
            "📊 Basic Statistics",
            format!("Last close: `{last_close}`\nAverage close ({period}): `{mean_close}`"),
            false,
        )
        .field(
            "📈 Return Distribution",
            format!(
                "Mean daily return: `{}`\nVolatility (Std Dev): `{}`\nSkewness: `{}`\nKurtosis: `{}`",
                percent(risk.mean),
                percent(risk.std_dev),
                moment(risk.skewness),
                moment(risk.kurtosis)
            ),
            true,
        )
        .field(
            format!("🚨 Risk Measures ({confidence_pct:.0}%)"),
            format!(
                "VaR ({confidence_pct:.0}%): `{}`\nExpected Shortfall: `{shortfall}`\nWin rate (daily): `{:.1}%`",
                percent(risk.value_at_risk),
                risk.win_rate * 100.0
            ),
            true,
        )
        .with_footer(format!(
            "VaR {confidence_pct:.0}% = {:.0}% chance of losing more than {:.2}% in one day (Gaussian assumption)",
            100.0 - confidence_pct,
            (risk.value_at_risk * 100.0).abs()
        ))
        .with_chart(ChartSpec::Histogram {
            title: format!("Probability Distribution: {symbol} ({period})"),
            bins: histogram(returns.values(), HISTOGRAM_BINS),
            markers: vec![
                Marker {
                    label: format!("Mean ({})", percent(risk.mean)),
                    value: risk.mean,
                },
                Marker {
                    label: format!("VaR {confidence_pct:.0}% ({})", percent(risk.value_at_risk)),
                    value: risk.value_at_risk,
                },
            ],
        })
}

pub fn quote_report(quote: &QuoteSnapshot) -> RenderPayload {
    let (tone, change) = match quote.change() {
        Some((abs, pct)) => {
            let sign = if abs >= 0.0 { "+" } else { "" };
            let tone = if abs >= 0.0 {
                Tone::Positive
            } else {
                Tone::Negative
            };
            (tone, format!("{sign}{abs:.2} ({sign}{pct:.2}%)"))
        }
        None => (Tone::Neutral, NOT_AVAILABLE.to_string()),
    };

    let price = |v: Option<f64>| v.map_or_else(|| NOT_AVAILABLE.to_string(), money_f64);
    let name = quote.short_name.as_deref().unwrap_or(&quote.symbol);

    RenderPayload::new(format!("{name} ({})", quote.symbol), tone)
        .field("Current Price", format!("**{}**", price(quote.price)), true)
        .field("Change", format!("**{change}**"), true)
        .field("Previous Close", price(quote.previous_close), false)
        .field("Open", price(quote.open), true)
        .field(
            "Day Range",
            format!("{} - {}", price(quote.day_low), price(quote.day_high)),
            true,
        )
        .field(
            "Volume",
            quote
                .volume
                .map_or_else(|| NOT_AVAILABLE.to_string(), |v| group_thousands(&v.to_string())),
            false,
        )
        .field(
            "Market Cap",
            quote
                .market_cap
                .map_or_else(|| NOT_AVAILABLE.to_string(), |v| money_f64(v.round())),
            true,
        )
        .field(
            "P/E (TTM)",
            quote
                .trailing_pe
                .map_or_else(|| NOT_AVAILABLE.to_string(), |v| format!("{v:.2}")),
            true,
        )
}

/// Headlines report; items are expected to be translated already
pub fn news_report(symbol: &str, items: &[NewsItem]) -> RenderPayload {
    let mut payload = RenderPayload::new(format!("📰 Latest news for {symbol}"), Tone::Info)
        .with_footer(format!("Showing the {} most recent item(s)", items.len()));
    payload.thumbnail_url = items.first().and_then(|i| i.thumbnail_url.clone());

    for item in items {
        let published = item
            .published_at
            .map_or_else(|| NOT_AVAILABLE.to_string(), |t| t.format("%d/%m/%Y %H:%M").to_string());

        let mut value = format!(
            "**Publisher:** {}\n**Published:** {published}\n",
            item.publisher.as_deref().unwrap_or(NOT_AVAILABLE)
        );
        if let Some(summary) = item.summary.as_deref().filter(|s| !s.trim().is_empty()) {
            value.push_str(&ellipsize(summary, NEWS_SUMMARY_MAX));
            value.push('\n');
        }
        value.push_str(&format!(
            "[🔗 Read more]({})",
            item.link.as_deref().unwrap_or("#")
        ));

        payload = payload.field(
            format!("▶️ {}", ellipsize(&item.title, NEWS_TITLE_MAX)),
            value,
            false,
        );
    }

    payload
}

pub fn market_overview_report(overview: &MarketOverview, top_n: usize) -> RenderPayload {
    let tone = match overview.average_change {
        Some(avg) if avg < 0.0 => Tone::Negative,
        Some(_) => Tone::Positive,
        None => Tone::Neutral,
    };
    let average = overview
        .average_change
        .map_or_else(|| NOT_AVAILABLE.to_string(), |a| format!("{a:.2}%"));

    let mut footer = "Limited to the configured universe; quotes may be delayed".to_string();
    if overview.failed > 0 {
        footer.push_str(&format!(" ({} symbol(s) unavailable)", overview.failed));
    }

    RenderPayload::new("📊 Market Overview", tone)
        .with_description(format!("Latest session as of {}", overview.as_of.format("%d/%m/%Y")))
        .field(
            "Breadth",
            format!(
                "Advancing: `{}`\nDeclining: `{}`\nAverage change: `{average}`",
                overview.gainers, overview.losers
            ),
            false,
        )
        .field(
            format!("📈 Top Gainers (Top {top_n})"),
            mover_list(&overview.top_gainers, false),
            true,
        )
        .field(
            format!("📉 Top Losers (Top {top_n})"),
            mover_list(&overview.top_losers, false),
            true,
        )
        .field(
            format!("🔥 Most Active (Top {top_n})"),
            mover_list(&overview.most_active, true),
            false,
        )
        .with_footer(footer)
}

fn mover_list(movers: &[MarketMover], show_volume: bool) -> String {
    if movers.is_empty() {
        return NOT_AVAILABLE.to_string();
    }

    movers
        .iter()
        .map(|m| {
            let detail = if show_volume {
                group_thousands(&m.volume.to_string())
            } else {
                let sign = if m.change_percent >= 0.0 { "+" } else { "" };
                format!("{sign}{:.2}%", m.change_percent)
            };
            format!("**{}** - {} ({detail})", m.symbol, money_f64(m.price))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Equal-width histogram over the value range
pub fn histogram(values: impl Iterator<Item = f64>, bins: usize) -> Vec<HistogramBin> {
    let values: Vec<f64> = values.filter(|v| v.is_finite()).collect();
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if max <= min {
        return vec![HistogramBin {
            lower: min,
            upper: max,
            count: values.len(),
        }];
    }

    let width = (max - min) / bins as f64;
    let mut counts = vec![0_usize; bins];
    for v in &values {
        // The maximum lands in the last bin
        let idx = (((v - min) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            lower: min + width * i as f64,
            upper: min + width * (i + 1) as f64,
            count,
        })
        .collect()
}

/// `$1,234.56`, `-$1,234.56`
pub fn money(value: Decimal) -> String {
    let rounded = format!("{:.2}", value.round_dp(2).abs());
    let (int_part, frac) = rounded.split_once('.').unwrap_or((rounded.as_str(), "00"));
    let sign = if value.is_sign_negative() && !value.round_dp(2).is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}${}.{frac}", group_thousands(int_part))
}

pub fn money_f64(value: f64) -> String {
    Decimal::from_f64_retain(value).map_or_else(|| format!("${value:.2}"), money)
}

/// Fraction as a percentage with two decimals
pub fn percent(fraction: f64) -> String {
    format!("{:.2}%", fraction * 100.0)
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn ellipsize(text: &str, max: usize) -> String {
    let cut = truncate_chars(text, max);
    if cut.len() < text.len() {
        format!("{cut}...")
    } else {
        text.to_string()
    }
}

fn to_f64(value: Decimal) -> f64 {
    use rust_decimal::prelude::ToPrimitive;
    value.to_f64().unwrap_or(f64::NAN)
}
