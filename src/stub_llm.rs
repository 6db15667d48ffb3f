use crate::config::LlmConfig;
use crate::llm_backend::LlmBackend;
use crate::types::LlmAnswer;
use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

/// エラー応答を誘発するトリガー語（大文字小文字を区別しない）
const ERROR_TRIGGER: &str = "error test";

/// エラー時の応答メッセージ
const ERROR_MESSAGE: &str = "LLMからの応答取得中にエラーが発生しました（シミュレート）。";

/// 固定の解説文
const DUMMY_EXPLANATION: &str = "LLMからの詳細なダミー解説です。\n手打ち興行のメリットとしては、企画の自由度が高いこと、成功時のリターンが大きいことなどが挙げられます。一方、デメリットとしては、集客が振るわなかった場合などのリスクをすべて主催者が負う必要がある点です。\n\n対して「売り興行」は、地方の興行主などが、都市部のプロダクションやアーティストからパッケージ化された公演内容を買い取り、自身の地域で興行を行う形態です。この場合、地方の興行主は一定の金額を支払うことで、集客リスクの一部または大部分を軽減できますが、大きな利益も期待しにくいという特徴があります。\n\nご質問の選択肢について見てみましょう。\n① 手打ち興行とは地方公共ホールが主催する興行のことである → 誤り。手打ち興行は主に民間事業者（事務所など）が主催します。\n② 売り興行は、主催者が収益リスクを完全に負うモデルである → 誤り。売り興行は買い手側（地方興行主など）のリスクは限定的です。リスクを負うのはむしろ売り手側（コンテンツ提供側）や、手打ち興行の主催者です。\n③ 手打ち興行は、都市部でリスクと利益を事務所側がすべて負う自主興行のことである → 正しい説明です。\n④ 売り興行とは、アーティストが自主的に企画・実施する興行のことをいう → 誤り。これは手打ち興行の説明に近いか、あるいはインディーズ活動の形態です。\n⑤ 手打ち興行と売り興行では、収益モデルに大きな差異はない → 誤り。リスク負担と収益分配のモデルが大きく異なります。";

/// LLMバックエンドのスタブ実装
///
/// 実際の推論は行わず、固定遅延の後に固定の回答・解説を返す。
/// 質問に "error test" が含まれる場合はエラー応答を返し、
/// オーケストレーション層のエラー表示経路をテストできる。
pub struct StubLlm {
    delay: Duration,
}

impl StubLlm {
    pub fn new(config: &LlmConfig) -> Self {
        Self {
            delay: Duration::from_millis(config.delay_ms),
        }
    }
}

#[async_trait]
impl LlmBackend for StubLlm {
    async fn ask(&self, question: &str) -> Result<LlmAnswer> {
        log::debug!("LLMに質問を送信中（シミュレート）: \"{}\"", question);
        tokio::time::sleep(self.delay).await;

        if question.to_lowercase().contains(ERROR_TRIGGER) {
            return Ok(LlmAnswer {
                answer: String::new(),
                explanation: String::new(),
                error: Some(ERROR_MESSAGE.to_string()),
            });
        }

        Ok(LlmAnswer {
            answer: format!(
                "これは「{}」に対するLLMのダミー回答です。手打ち興行とは、興行主が自ら企画し、費用を負担し、収益も損失もすべて自らで引き受ける興行形態を指します。特に都市部で行われることが多く、事務所やプロモーターが大きなリスクを負う代わりに、成功した場合の利益も大きくなります。",
                question
            ),
            explanation: DUMMY_EXPLANATION.to_string(),
            error: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stub() -> StubLlm {
        StubLlm::new(&LlmConfig { delay_ms: 0 })
    }

    #[tokio::test]
    async fn returns_canned_answer() {
        let answer = stub().ask("手打ち興行とは何ですか").await.unwrap();

        assert!(answer.answer.contains("手打ち興行とは何ですか"));
        assert!(!answer.explanation.is_empty());
        assert!(answer.error.is_none());
    }

    #[tokio::test]
    async fn error_trigger_is_case_insensitive() {
        for question in ["error test", "Error Test", "これは ERROR TEST です"] {
            let answer = stub().ask(question).await.unwrap();

            assert!(answer.answer.is_empty());
            assert!(answer.explanation.is_empty());
            assert!(answer.error.is_some());
            assert!(!answer.error.unwrap().is_empty());
        }
    }
}
