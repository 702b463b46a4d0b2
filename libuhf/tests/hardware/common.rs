#![cfg(feature = "serial")]

//! 共通: 実機テスト用ヘルパー
//!
//! `LIBUHF_PORT` に接続先のシリアルポートを指定して実行します。
//! 未指定の環境（CI 等）では `Ok(None)` を返し、テストは何もせず終了します。

use libuhf::prelude::*;

/// Connect to the reader named by `LIBUHF_PORT`.
///
/// - Ok(Some(reader)) : 接続成功
/// - Ok(None) : ポート未指定
/// - Err(e) : その他の致命的なエラー
pub fn connect_from_env() -> Result<Option<Reader<Connected>>> {
    let _ = env_logger::builder().is_test(true).try_init();
    let Ok(port) = std::env::var("LIBUHF_PORT") else {
        return Ok(None);
    };
    let reader = ReaderBuilder::new()
        .with_serial_port()
        .connect(&port)?;
    Ok(Some(reader))
}
