// Player pool loading.
//
// Reads a roster spreadsheet exported as CSV. The export may carry title or
// notice rows above the real header, so the header is located by content
// rather than assumed to be the first row.

use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use tracing::{info, warn};

use crate::draft::player::Player;

/// A cell containing any of these marks the header row.
const HEADER_MARKERS: &[&str] = &["닉네임", "Name"];

const NAME_KEYS: &[&str] = &["닉네임", "Name", "name"];
const INGAME_KEYS: &[&str] = &["롤 계정", "롤계정", "IngameName", "Ign"];
const POSITION_KEYS: &[&str] = &["포지션", "Position", "position"];
const TIER_KEYS: &[&str] = &["티어", "Tier", "tier"];
const MOST_KEYS: &[&str] = &["주챔", "모스트", "Most"];

const DEFAULT_POSITION: &str = "MID";
const DEFAULT_TIER: &str = "Unranked";

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("no header row (a column named 닉네임 or Name) in {path}")]
    HeaderNotFound { path: String },
}

// ---------------------------------------------------------------------------
// Column mapping
// ---------------------------------------------------------------------------

/// Column positions resolved from the header row.
#[derive(Debug, Clone, Copy)]
struct Columns {
    name: Option<usize>,
    ingame: Option<usize>,
    position: Option<usize>,
    tier: Option<usize>,
    most: Option<usize>,
}

impl Columns {
    fn from_header(header: &StringRecord) -> Self {
        Columns {
            name: find_column(header, NAME_KEYS),
            ingame: find_column(header, INGAME_KEYS),
            position: find_column(header, POSITION_KEYS),
            tier: find_column(header, TIER_KEYS),
            most: find_column(header, MOST_KEYS),
        }
    }

    /// Build a player from a data row. Rows without a name yield `None`.
    fn player(&self, row_idx: usize, record: &StringRecord) -> Option<Player> {
        let cell = |col: Option<usize>| col.and_then(|i| record.get(i)).map(str::trim);

        let name = cell(self.name).filter(|n| !n.is_empty())?;
        let ingame = cell(self.ingame).unwrap_or(name);
        let position = cell(self.position)
            .map(str::to_uppercase)
            .unwrap_or_else(|| DEFAULT_POSITION.to_string());
        let tier = cell(self.tier).unwrap_or(DEFAULT_TIER);

        let mut player = Player::new(format!("p-{row_idx}"), name, ingame, tier, position);
        player.most_champion = cell(self.most).and_then(first_champion);
        Some(player)
    }
}

/// Index of the first header cell containing any of `keywords`.
fn find_column(header: &StringRecord, keywords: &[&str]) -> Option<usize> {
    header
        .iter()
        .position(|cell| keywords.iter().any(|k| cell.contains(k)))
}

fn is_header(record: &StringRecord) -> bool {
    record
        .iter()
        .any(|cell| HEADER_MARKERS.iter().any(|m| cell.contains(m)))
}

/// Reduce a champion list ("Ahri, Syndra" or "Lee Sin/Viego") to its first entry.
fn first_champion(raw: &str) -> Option<String> {
    let first = raw.split(',').next().unwrap_or(raw);
    let first = first.split('/').next().unwrap_or(first).trim();
    (!first.is_empty()).then(|| first.to_string())
}

// ---------------------------------------------------------------------------
// Reader-based loader (private)
// ---------------------------------------------------------------------------

/// Parse a pool export. Returns `Ok(None)` when no header row exists.
///
/// Row indices count every non-blank line, header and preamble included,
/// and become the player ids.
fn load_pool_from_reader<R: Read>(rdr: R) -> Result<Option<Vec<Player>>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(rdr);

    let mut columns: Option<Columns> = None;
    let mut players = Vec::new();

    for (row_idx, result) in reader.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(e),
            Err(e) => {
                warn!("skipping malformed pool row {}: {}", row_idx, e);
                continue;
            }
        };

        let Some(cols) = columns else {
            if is_header(&record) {
                columns = Some(Columns::from_header(&record));
            }
            continue;
        };

        match cols.player(row_idx, &record) {
            Some(player) => players.push(player),
            None => warn!("skipping pool row {}: no name", row_idx),
        }
    }

    Ok(columns.map(|_| players))
}

// ---------------------------------------------------------------------------
// Public path-based loader
// ---------------------------------------------------------------------------

/// Load the player pool from a CSV export.
pub fn load_pool(path: &Path) -> Result<Vec<Player>, PoolError> {
    let file = std::fs::File::open(path).map_err(|e| PoolError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let players = load_pool_from_reader(file)
        .map_err(|e| PoolError::Csv {
            path: path.display().to_string(),
            source: e,
        })?
        .ok_or_else(|| PoolError::HeaderNotFound {
            path: path.display().to_string(),
        })?;

    info!("Loaded {} players from {}", players.len(), path.display());
    Ok(players)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
