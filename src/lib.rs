//! # kassenexport
//!
//! Turns point-of-sale exports into DATEV booking batches: invoice lists
//! paid at the counter (CSV), vending machine totals (XLSX), bakery cash
//! reports (PDF) and cash terminal listings (saved HTML pages).
//!
//! Data flows one way: a source adapter reads [`core::RawRow`]s, a
//! [`normalize::Normalizer`] maps them into [`core::LedgerEntry`] values and
//! the [`export`] module writes `;`-delimited batch files. A [`run::Run`]
//! wires the three together for one configured source.
//!
//! All monetary values use [`rust_decimal::Decimal`], never floating point.
//!
//! ## Quick Start
//!
//! ```rust
//! use kassenexport::core::RawRow;
//! use kassenexport::export::render_csv;
//! use kassenexport::normalize::{CashInvoice, Normalizer};
//!
//! let headers: Vec<String> = ["Status", "Bezahlt am", "Rechnungs-Nr.", "Rechnungsdatum", "Rechnungsbetrag"]
//!     .iter()
//!     .map(|h| h.to_string())
//!     .collect();
//! let row = RawRow::from_record(2, &headers, ["", "", "RE-1001", "15.03.2024", "1.614,70"]);
//!
//! let normalized = CashInvoice::new("EUR").normalize(&row).unwrap();
//! let csv = String::from_utf8(render_csv(&normalized.entries).unwrap()).unwrap();
//! assert!(csv.contains("EUR;+1614,70;RE-1001;1503;Kundenrechnung Zahlung Bar oder Karte;"));
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` | Ledger types, CSV sources, normalizers, export, runs |
//! | `xlsx` | Spreadsheet sources (vending machine exports) |
//! | `pdf` | PDF cash report sources |
//! | `html` | Saved HTML terminal listings |
//! | `cli` | The `kassenexport` binary and log file setup |
//! | `all` (default) | Everything |

#[cfg(feature = "core")]
pub mod config;

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "core")]
pub mod export;

#[cfg(feature = "cli")]
pub mod logging;

#[cfg(feature = "core")]
pub mod normalize;

#[cfg(feature = "core")]
pub mod operator;

#[cfg(feature = "core")]
pub mod run;

#[cfg(feature = "core")]
pub mod source;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;
