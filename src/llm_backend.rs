use crate::types::LlmAnswer;
use anyhow::Result;
use async_trait::async_trait;

/// LLM回答バックエンドの共通トレイト
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// 質問を送信して回答を取得
    ///
    /// # Returns
    /// 回答と解説のペア。バックエンド側のエラーは [`LlmAnswer::error`] に
    /// 格納して返し、`Err` は予期しない失敗にのみ使う。
    async fn ask(&self, question: &str) -> Result<LlmAnswer>;
}
