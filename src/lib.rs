/*!
# Sellers Dashboard

A browser-based sales dashboard with a small demo page, built in Rust.

## Overview

The sales page loads a latin-1 encoded CSV of sale records once at startup
and lets each visitor filter it by region and vendor. For the current
selection it shows the matching rows, three summary metrics and three
per-vendor bar charts. The demo page shows a fixed numeric table, a
histogram of 1000 standard-normal draws and an editable dessert table
together with the name of the highest-rated dessert.

## Architecture

### Pipelines
- **Sales**: Loader -> Column Normalizer -> Region/Vendor Filter -> Aggregator -> Presenter
- **Demo**: Numeric Table -> Histogram Sampler -> Dessert Table -> Favourite Lookup

Each pipeline is a plain function over its inputs and re-runs in full on
every interaction.

### Sessions
Per-visitor state (filter selection and the dessert table working copy)
lives in a [`session::SessionStore`] keyed by a cookie. Every interaction
is one `(state, event) -> (state, render)` transition through
[`session::step`].

### Web Layer (feature `web`)
- axum routes serving the page, JSON renders, events and exports
- plotters charts rendered to SVG

## Modules

- **error**: Error taxonomy and non-fatal warnings
- **config**: Runtime settings and defaults
- **normalize**: Column label normalization
- **loader**: CSV loading and typed record schema
- **filter**: Filter options, selection and filtered view
- **aggregate**: Summary metrics and per-vendor groups
- **format**: Metric text formatting
- **demo**: Demo tables, sampler, histogram and favourite lookup
- **pipeline**: The two pipelines composed from the stages above
- **session**: Session state machine and store
- **downloader**: CSV/XLSX export of the filtered view
- **graph**: Chart rendering
- **app**: HTTP routes

## REST API Endpoints

- `GET /api/sales` - Sales render for the visitor's session
- `POST /api/sales/event` - Apply a filter event
- `GET /api/sales/export.csv`, `GET /api/sales/export.xlsx` - Filtered rows
- `GET /api/demo` - Demo render
- `POST /api/demo/event` - Apply a dessert table edit
*/

pub mod aggregate;
pub mod config;
pub mod demo;
pub mod downloader;
pub mod error;
pub mod filter;
pub mod format;
pub mod loader;
pub mod normalize;
pub mod pipeline;
pub mod session;

#[cfg(feature = "web")]
pub mod app;
#[cfg(feature = "web")]
pub mod graph;

pub use config::DashboardConfig;
pub use error::{DashboardError, DashboardWarning, Result};
pub use pipeline::{SalesData, run_demo_pipeline, run_sales_pipeline};
