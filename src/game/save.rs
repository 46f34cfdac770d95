//! PlayerState のスナップショット形式 (JSON)。
//!
//! ## バージョニング方針
//!
//! - `SNAPSHOT_VERSION`: 現在のスナップショット形式バージョン。フィールド追加時にインクリメントする。
//! - `MIN_COMPATIBLE_VERSION`: 互換性を維持できる最小バージョン。
//!   新フィールドの追加のみの場合はこの値を変えない（旧データを維持できる）。
//!   既存フィールドの意味変更や削除など破壊的変更を行った場合のみインクリメントする。
//!
//! 旧バージョンのスナップショットは、`MIN_COMPATIBLE_VERSION` 以上であれば
//! 不足フィールドにデフォルト値を補完して読み込む。

use serde::{Deserialize, Serialize};

use super::state::PlayerState;
use crate::error::StoreError;

/// スナップショットのフォーマットバージョン。
/// v2: click_upgrades, cookies_all_time, created_at_ms, updated_at_ms を追加。
pub const SNAPSHOT_VERSION: u32 = 2;

/// 互換性を維持できる最小バージョン。
pub const MIN_COMPATIBLE_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct SnapshotData {
    version: u32,
    player: PlayerState,
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    player: &'a PlayerState,
}

/// PlayerState を JSON スナップショットに変換する。
pub fn encode_snapshot(state: &PlayerState) -> Result<String, StoreError> {
    serde_json::to_string(&SnapshotRef {
        version: SNAPSHOT_VERSION,
        player: state,
    })
    .map_err(|e| StoreError::Corrupt(format!("serialize {}: {e}", state.user_id)))
}

/// JSON スナップショットから PlayerState を復元する。
/// パースエラー、古すぎるバージョン、不変条件違反は `StoreError::Corrupt`。
pub fn decode_snapshot(json: &str) -> Result<PlayerState, StoreError> {
    let data: SnapshotData =
        serde_json::from_str(json).map_err(|e| StoreError::Corrupt(format!("parse: {e}")))?;

    if data.version < MIN_COMPATIBLE_VERSION {
        return Err(StoreError::Corrupt(format!(
            "snapshot version too old (saved={}, min_compatible={})",
            data.version, MIN_COMPATIBLE_VERSION
        )));
    }

    if data.version < SNAPSHOT_VERSION {
        tracing::debug!(
            user_id = %data.player.user_id,
            saved = data.version,
            current = SNAPSHOT_VERSION,
            "migrating old snapshot"
        );
    }

    if data.player.click_power == 0 {
        return Err(StoreError::Corrupt(format!(
            "click_power is 0 for {}",
            data.player.user_id
        )));
    }

    Ok(data.player)
}
