// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Market catalogue and trading hours.

use chrono::{DateTime, Datelike, FixedOffset, Timelike, Utc};
use serde::Serialize;

/// Local trading session, weekdays numbered from Sunday = 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TradingHours {
    pub open: (u32, u32),
    pub close: (u32, u32),
    pub days: &'static [u32],
}

const SUN_THU: &[u32] = &[0, 1, 2, 3, 4];
const MON_FRI: &[u32] = &[1, 2, 3, 4, 5];

/// A stock exchange the app can be pointed at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Market {
    pub id: &'static str,
    pub name: &'static str,
    pub flag: &'static str,
    pub currency: &'static str,
    /// Ticker suffix appended for quote lookups (".SR", ".L", ...)
    pub suffix: &'static str,
    /// Benchmark index symbol
    pub index: &'static str,
    pub exchange: &'static str,
    pub timezone: &'static str,
    /// Standard-time UTC offset in minutes
    pub utc_offset_minutes: i32,
    pub hours: TradingHours,
}

macro_rules! market {
    ($id:expr, $name:expr, $flag:expr, $cur:expr, $suffix:expr, $index:expr, $exch:expr, $tz:expr, $off:expr, $open:expr, $close:expr, $days:expr) => {
        Market {
            id: $id,
            name: $name,
            flag: $flag,
            currency: $cur,
            suffix: $suffix,
            index: $index,
            exchange: $exch,
            timezone: $tz,
            utc_offset_minutes: $off,
            hours: TradingHours {
                open: $open,
                close: $close,
                days: $days,
            },
        }
    };
}

/// All supported markets. The first entry is the default selection.
pub static MARKETS: [Market; 23] = [
    market!("SA", "Saudi Arabia", "🇸🇦", "SAR", ".SR", "^TASI.SR", "Tadawul", "Asia/Riyadh", 180, (10, 0), (15, 0), SUN_THU),
    market!("EG", "Egypt", "🇪🇬", "EGP", ".CA", "^CASE30", "EGX", "Africa/Cairo", 120, (10, 0), (14, 30), SUN_THU),
    market!("US", "USA", "🇺🇸", "USD", "", "^DJI", "NYSE/NASDAQ", "America/New_York", -300, (9, 30), (16, 0), MON_FRI),
    market!("IN", "India", "🇮🇳", "INR", ".NS", "^NSEI", "NSE", "Asia/Kolkata", 330, (9, 15), (15, 30), MON_FRI),
    market!("UK", "United Kingdom", "🇬🇧", "GBP", ".L", "^FTSE", "LSE", "Europe/London", 0, (8, 0), (16, 30), MON_FRI),
    market!("CA", "Canada", "🇨🇦", "CAD", ".TO", "^GSPTSE", "TSX", "America/Toronto", -300, (9, 30), (16, 0), MON_FRI),
    market!("AU", "Australia", "🇦🇺", "AUD", ".AX", "^AXJO", "ASX", "Australia/Sydney", 600, (10, 0), (16, 0), MON_FRI),
    market!("HK", "Hong Kong", "🇭🇰", "HKD", ".HK", "^HSI", "HKEX", "Asia/Hong_Kong", 480, (9, 30), (16, 0), MON_FRI),
    market!("DE", "Germany", "🇩🇪", "EUR", ".DE", "^GDAXI", "XETRA", "Europe/Berlin", 60, (9, 0), (17, 30), MON_FRI),
    market!("JP", "Japan", "🇯🇵", "JPY", ".T", "^N225", "TSE", "Asia/Tokyo", 540, (9, 0), (15, 0), MON_FRI),
    market!("AE", "UAE", "🇦🇪", "AED", ".AE", "EMAAR.AE", "ADX/DFM", "Asia/Dubai", 240, (10, 0), (15, 0), MON_FRI),
    market!("ZA", "South Africa", "🇿🇦", "ZAR", ".JO", "JSE.JO", "JSE", "Africa/Johannesburg", 120, (9, 0), (17, 0), MON_FRI),
    market!("QA", "Qatar", "🇶🇦", "QAR", ".QA", "QNBK.QA", "QSE", "Asia/Qatar", 180, (9, 30), (13, 15), SUN_THU),
    market!("FR", "France", "🇫🇷", "EUR", ".PA", "^FCHI", "Euronext Paris", "Europe/Paris", 60, (9, 0), (17, 30), MON_FRI),
    market!("CH", "Switzerland", "🇨🇭", "CHF", ".SW", "^SSMI", "SIX", "Europe/Zurich", 60, (9, 0), (17, 30), MON_FRI),
    market!("NL", "Netherlands", "🇳🇱", "EUR", ".AS", "^AEX", "Euronext Amsterdam", "Europe/Amsterdam", 60, (9, 0), (17, 30), MON_FRI),
    market!("ES", "Spain", "🇪🇸", "EUR", ".MC", "^IBEX", "BME", "Europe/Madrid", 60, (9, 0), (17, 30), MON_FRI),
    market!("IT", "Italy", "🇮🇹", "EUR", ".MI", "FTSEMIB.MI", "Borsa Italiana", "Europe/Rome", 60, (9, 0), (17, 30), MON_FRI),
    market!("BR", "Brazil", "🇧🇷", "BRL", ".SA", "^BVSP", "B3", "America/Sao_Paulo", -180, (10, 0), (17, 0), MON_FRI),
    market!("MX", "Mexico", "🇲🇽", "MXN", ".MX", "^MXX", "BMV", "America/Mexico_City", -360, (8, 30), (15, 0), MON_FRI),
    market!("KR", "South Korea", "🇰🇷", "KRW", ".KS", "^KS11", "KRX", "Asia/Seoul", 540, (9, 0), (15, 30), MON_FRI),
    market!("TW", "Taiwan", "🇹🇼", "TWD", ".TW", "^TWII", "TWSE", "Asia/Taipei", 480, (9, 0), (13, 30), MON_FRI),
    market!("SG", "Singapore", "🇸🇬", "SGD", ".SI", "^STI", "SGX", "Asia/Singapore", 480, (9, 0), (17, 0), MON_FRI),
];

impl Market {
    /// Look up a market by id.
    pub fn find(id: &str) -> Option<&'static Market> {
        MARKETS.iter().find(|m| m.id == id)
    }

    /// The default market (Saudi Arabia).
    pub fn default_market() -> &'static Market {
        &MARKETS[0]
    }

    /// Whether the exchange is inside its trading session at `now`.
    ///
    /// Uses the standard-time offset; daylight saving shifts are ignored.
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        let Some(offset) = FixedOffset::east_opt(self.utc_offset_minutes * 60) else {
            return false;
        };
        let local = now.with_timezone(&offset);

        if !self.hours.days.contains(&local.weekday().num_days_from_sunday()) {
            return false;
        }

        let minutes = local.hour() * 60 + local.minute();
        let open = self.hours.open.0 * 60 + self.hours.open.1;
        let close = self.hours.close.0 * 60 + self.hours.close.1;
        minutes >= open && minutes <= close
    }

    /// Quote symbol for a bare ticker on this market ("2222" -> "2222.SR").
    pub fn symbol_for(&self, ticker: &str) -> String {
        if self.suffix.is_empty() || ticker.ends_with(self.suffix) || ticker.starts_with('^') {
            ticker.to_string()
        } else {
            format!("{}{}", ticker, self.suffix)
        }
    }
}
