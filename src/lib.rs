/*!
# Sentiscope

A browser-based sentiment and emotion analysis dashboard, built in Rust.

## Overview

Users sign up and log in, then either type a piece of text or upload a CSV
file with a `text` column. Every text is scored with a lexicon-based polarity
scorer and labelled, either with a three-way sentiment label or with a
five-way emotion label. The labelled table can be explored, cleaned of
missing values, charted and downloaded.

## Architecture

### Frontend Layer
- **Technologies**: HTML, CSS, plain JavaScript
- **Key Components**:
  - Login page - Sign-up and login forms
  - Dashboard - Mode selector, text and CSV input, results, exploration panel

### Backend Layer
- **Technologies**: Rust, axum
- **Core Components**:
  - Polarity Scorer - Lexicon lookup with negation, boosters and emphasis rules
  - Classifier - Threshold tables mapping a compound score to a label
  - Table Engine - Typed view over CSV data with summary statistics
  - Session Registry - Per-visitor identity store and analysed dataset

## Modules

- **error**: Error type shared by every layer
- **config**: Server configuration from command line arguments
- **login**: User registration and authentication
- **session**: Per-visitor state and idle eviction
- **sentiment**: Lexicon-based polarity scoring
- **classify**: Analysis modes, labels and threshold tables
- **table**: In-memory table with pandas-like exploration helpers
- **loader**: CSV parsing
- **report**: Analysis flow and the report shown after it
- **downloader**: Export functionality (CSV, XLSX)
- **graph**: Label frequency bar chart
- **app**: Routing and middleware

## REST API Endpoints

- `/api/signup`, `/api/login`, `/api/logout` - Account handling
- `/api/analyze/text`, `/api/analyze/csv` - Run an analysis
- `/api/results.csv`, `/api/results.xlsx` - Download the labelled table
- `/api/chart.png` - Label frequency chart
- `/api/dataset/{head,tail,info,shape,describe,dtypes,nulls}` - Explore the labelled table
- `/api/dataset/{dropna,fillna}` - Remove or fill missing values
*/

pub mod classify;
pub mod config;
pub mod downloader;
pub mod error;
pub mod loader;
pub mod login;
pub mod report;
pub mod sentiment;
pub mod session;
pub mod table;

#[cfg(feature = "web")]
pub mod app;
#[cfg(feature = "web")]
pub mod graph;

/// Re-export the types most callers need
pub use classify::{AnalysisMode, Label};
pub use error::AppError;
pub use sentiment::{LexiconScorer, PolarityScorer, PolarityScores};
pub use table::DataTable;
