//! Board geometry endpoint

use axum::{extract::Path, Json};
use parques_core::{BoardVariant, Cell};
use serde::Serialize;

use super::error::ApiError;

#[derive(Serialize)]
pub struct SeatInfo {
    pub seat: usize,
    pub entry_cell: Cell,
    pub home_entry_cell: Cell,
}

#[derive(Serialize)]
pub struct BoardInfo {
    pub variant: BoardVariant,
    pub total_cells: Cell,
    pub safe_cells: Vec<Cell>,
    pub home_stretch_len: u8,
    pub seats: Vec<SeatInfo>,
}

/// Get board geometry for a variant ("4" or "6")
pub async fn get_board(Path(variant): Path<String>) -> Result<Json<BoardInfo>, ApiError> {
    let variant = BoardVariant::parse(&variant)
        .ok_or_else(|| ApiError::not_found(format!("unknown board variant '{}'", variant)))?;
    let geometry = variant.geometry();

    let seats = (0..variant.seats())
        .map(|seat| SeatInfo {
            seat,
            entry_cell: geometry.entry_cell_of(seat),
            home_entry_cell: geometry.home_entry_cell_of(seat),
        })
        .collect();

    Ok(Json(BoardInfo {
        variant,
        total_cells: geometry.total_cells,
        safe_cells: geometry.safe_cells.to_vec(),
        home_stretch_len: geometry.home_stretch_len,
        seats,
    }))
}
