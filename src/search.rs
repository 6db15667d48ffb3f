use crate::config::SearchConfig;
use crate::templates::{OptionTemplate, TemplateTable};
use crate::types::SearchResult;
use anyhow::Result;
use regex_lite::Regex;
use std::time::Duration;

/// 質問がキーフレーズ先頭の何文字を含めば「そのテンプレートへの言及」と
/// みなすかの文字数
const KEY_PREFIX_CHARS: usize = 15;

/// 再走査パスでキーフレーズ末尾から無視する文字数
///
/// テンプレート照合パスの副次規則（先頭15文字）と長さが揃っていないのは
/// 元実装からの仕様であり、意図的に統合していない。
/// `tests::paste_rule_prefix_asymmetry` がこの差異を固定している。
const PASTE_SUFFIX_CHARS: usize = 5;

/// 選択肢への言及を示すマーカー語
const OPTION_MARKER: &str = "選択肢";

/// 一致なしの場合の回答文
const NO_MATCH_ANSWER: &str = "明確な回答や根拠は見つかりませんでした。";

/// 文単位の汎用一致の場合の回答文
const GENERIC_ANSWER: &str = "以下の関連する可能性のある記述が見つかりました。";

/// 根拠検索器
///
/// 文字起こしテキストと質問から、回答ラベルと逐語的な根拠文を探す。
/// 照合は3段階のパスで行い、先に結果を出したパスが勝つ。
///
/// # アルゴリズム
///
/// 1. **テンプレート照合パス**: テンプレートテーブルを定義順に走査する。
///    質問がテンプレートに言及しており（ラベルを含む、キーフレーズの
///    先頭15文字を含む、または「選択肢」とラベルを含む）、かつ
///    文字起こしにキーフレーズが含まれていれば、そのテンプレートの
///    完全文を根拠として返す。
/// 2. **文単位の汎用照合パス**: 文字起こしを「.」「。」で文に分割し、
///    質問の単語（2文字以上）が文に含まれる数を数える。過半数の単語が
///    含まれる文（または単語数に応じた緩和条件を満たす文）を根拠として
///    返す。
/// 3. **テンプレート再走査パス**: 質問がキーフレーズの大部分
///    （末尾5文字を除く先頭部分）を含み、文字起こしにキーフレーズが
///    含まれていれば一致とみなす。
///
/// どのパスも一致しなければ「見つからなかった」結果を返す。
/// 照合はすべて小文字化した作業コピーで行い、返す根拠は常に
/// 元の表記のまま。副作用はなく、同じ入力には同じ結果を返す。
///
/// # Examples
///
/// ```
/// # use whisper_qa::config::SearchConfig;
/// # use whisper_qa::search::EvidenceSearcher;
/// # use whisper_qa::templates::TemplateTable;
/// # let rt = tokio::runtime::Runtime::new().unwrap();
/// let config = SearchConfig { delay_ms: 0 };
/// let searcher = EvidenceSearcher::new(TemplateTable::builtin(), &config).unwrap();
///
/// let result = rt
///     .block_on(searcher.search("今日は晴れです。明日は雨です。", "晴れ"))
///     .unwrap();
/// assert_eq!(result.evidence, "今日は晴れです。");
/// ```
pub struct EvidenceSearcher {
    /// 選択肢テンプレートのテーブル（定義順に照合）
    table: TemplateTable,

    /// 検索1回あたりの擬似遅延
    ///
    /// 将来のリモート検索バックエンドを想定した一律のサスペンド
    delay: Duration,

    /// 文分割用の正規表現（ASCIIピリオドと全角句点）
    sentence_re: Regex,

    /// 単語分割用の正規表現（空白文字の並び）
    word_re: Regex,
}

impl EvidenceSearcher {
    pub fn new(table: TemplateTable, config: &SearchConfig) -> Result<Self> {
        Ok(Self {
            table,
            delay: Duration::from_millis(config.delay_ms),
            sentence_re: Regex::new(r"[.。]")?,
            word_re: Regex::new(r"\s+")?,
        })
    }

    /// 文字起こしテキスト内で質問への回答と根拠を検索
    ///
    /// # Arguments
    ///
    /// * `transcription` - 文字起こしの全文（空でもよい）
    /// * `question` - 質問文（空でもよい。空なら一致なしに落ちる）
    ///
    /// # Returns
    ///
    /// 必ず3種別（テンプレート一致・汎用一致・一致なし）のいずれか
    /// 1つの [`SearchResult`] を返す。整形済みテキスト入力で
    /// エラーになることはない。
    pub async fn search(&self, transcription: &str, question: &str) -> Result<SearchResult> {
        tokio::time::sleep(self.delay).await;

        let lower_question = question.to_lowercase();
        let lower_transcription = transcription.to_lowercase();

        // 1. テンプレート照合パス
        if let Some(result) = self.match_templates(&lower_question, &lower_transcription) {
            return Ok(result);
        }

        // 2. 文単位の汎用照合パス
        if let Some(result) = self.match_sentences(transcription, &lower_question) {
            return Ok(result);
        }

        // 3. テンプレート再走査パス
        if let Some(result) = self.rescan_templates(&lower_question, &lower_transcription) {
            return Ok(result);
        }

        log::debug!("根拠検索: 一致なし");
        Ok(SearchResult::not_found(NO_MATCH_ANSWER.to_string()))
    }

    /// テンプレート照合パス
    ///
    /// 1テンプレートの不一致でパス全体を打ち切らず、次のテンプレートへ進む。
    fn match_templates(
        &self,
        lower_question: &str,
        lower_transcription: &str,
    ) -> Option<SearchResult> {
        for template in self.table.iter() {
            let lower_key = template.key.to_lowercase();
            let lower_label = template.label.to_lowercase();
            let key_prefix = char_prefix(&lower_key, KEY_PREFIX_CHARS);

            // 質問がこのテンプレートに言及しているか
            let refers_to = lower_question.contains(&lower_label)
                || lower_question.contains(key_prefix.as_str())
                || (lower_question.contains(OPTION_MARKER)
                    && lower_question.contains(&lower_label));

            if refers_to {
                // 言及されている場合、文字起こし内にキーフレーズがあるか確認
                if lower_transcription.contains(&lower_key) {
                    log::debug!("根拠検索: テンプレート {} に一致", template.label);
                    return Some(SearchResult::template(
                        format!("選択肢 {} が関連しているようです。", template.label),
                        template.sentence.clone(),
                    ));
                }
            } else if lower_transcription.contains(&lower_key)
                && lower_question.contains(key_prefix.as_str())
            {
                // 副次規則: 質問がテンプレート文そのものを貼り付けている場合
                return Some(Self::contained_result(template));
            }
        }
        None
    }

    /// 文単位の汎用照合パス
    ///
    /// 文字起こしを文に分割し、質問の単語が多く含まれる最初の文を返す。
    fn match_sentences(&self, transcription: &str, lower_question: &str) -> Option<SearchResult> {
        let words: Vec<&str> = self
            .word_re
            .split(lower_question)
            .filter(|w| w.chars().count() > 1)
            .collect();
        if words.is_empty() {
            return None;
        }

        for sentence in self
            .sentence_re
            .split(transcription)
            .filter(|s| !s.trim().is_empty())
        {
            let lower_sentence = sentence.to_lowercase();
            let match_count = words
                .iter()
                .filter(|word| lower_sentence.contains(*word))
                .count();
            let word_count = words.len();

            let accepted = (match_count as f64 / word_count as f64) > 0.5
                || (word_count > 2 && match_count >= 2)
                || (word_count <= 2 && match_count >= 1);

            if accepted {
                let trimmed = sentence.trim();
                // 分割で落ちた句点を復元する（元の文字起こしにあった場合のみ）
                let evidence = if transcription.contains(&format!("{}。", trimmed)) {
                    format!("{}。", trimmed)
                } else {
                    trimmed.to_string()
                };
                log::debug!(
                    "根拠検索: 汎用一致 ({}/{} 単語)",
                    match_count,
                    word_count
                );
                return Some(SearchResult::generic(GENERIC_ANSWER.to_string(), evidence));
            }
        }
        None
    }

    /// テンプレート再走査パス
    ///
    /// 質問がキーフレーズの大部分（末尾5文字を除く）を含む場合の救済。
    fn rescan_templates(
        &self,
        lower_question: &str,
        lower_transcription: &str,
    ) -> Option<SearchResult> {
        for template in self.table.iter() {
            let lower_key = template.key.to_lowercase();
            let prefix_len = lower_key.chars().count().saturating_sub(PASTE_SUFFIX_CHARS);
            let key_prefix = char_prefix(&lower_key, prefix_len);

            if lower_question.contains(key_prefix.as_str())
                && lower_transcription.contains(&lower_key)
            {
                return Some(Self::contained_result(template));
            }
        }
        None
    }

    /// 「その内容は含まれている」形式の結果を作成
    fn contained_result(template: &OptionTemplate) -> SearchResult {
        SearchResult::template(
            format!(
                "はい、その内容は文字起こし内に含まれています。 (選択肢 {} に関連)",
                template.label
            ),
            template.sentence.clone(),
        )
    }
}

/// 文字列の先頭 n 文字を取り出す
///
/// バイト境界ではなく文字（char）単位で数える。
fn char_prefix(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}
