use crate::config::TranscribeConfig;
use crate::templates::TemplateTable;
use crate::types::{Transcript, TranscriptSegment};
use crate::upload::UploadedFile;
use anyhow::Result;
use std::time::Duration;

/// 文節をつなぐ接続表現（ダミーテキスト生成用）
const CONNECTIVES: [&str; 3] = ["といった内容や、", "といった点、", "ということ、"];

/// 文字起こしのシミュレータ
///
/// 実際の音声認識は行わず、固定遅延の後にテンプレート文を埋め込んだ
/// ダミーの文字起こしテキストを返す。生成されるテキストは決定的で、
/// 同じファイル名からは常に同じ文字起こしが得られる。
pub struct SimulatedTranscriber {
    delay: Duration,
    language: String,
    repeat_count: usize,
    table: TemplateTable,
}

impl SimulatedTranscriber {
    pub fn new(config: &TranscribeConfig, table: TemplateTable) -> Self {
        Self {
            delay: Duration::from_millis(config.delay_ms),
            language: config.language.clone(),
            repeat_count: config.repeat_count,
            table,
        }
    }

    /// 音声ファイルの文字起こしをシミュレート
    ///
    /// 固定遅延の後、ファイル名とテンプレート文を埋め込んだダミーの
    /// 文字起こしを全文とセグメントの形で返す。
    pub async fn transcribe(&self, file: &UploadedFile) -> Result<Transcript> {
        log::info!(
            "ファイル名: {} の文字起こしをシミュレート中 (言語: {})",
            file.file_name,
            self.language
        );
        tokio::time::sleep(self.delay).await;

        let text = self.dummy_text(&file.file_name);
        let segments = split_segments(&text);

        log::info!(
            "文字起こしのシミュレーションが完了しました ({}文字, {}セグメント)",
            text.chars().count(),
            segments.len()
        );
        Ok(Transcript::new(file.file_name.clone(), text, segments))
    }

    /// ダミーの文字起こしテキストを生成
    ///
    /// テンプレートの全文を接続表現でつないだ段落を repeat_count 回
    /// 繰り返す。
    fn dummy_text(&self, file_name: &str) -> String {
        let mut paragraph = format!(
            "これはファイル {} のためのシミュレートされた文字起こしです。いくつかのサンプルテキストを含んでいます。",
            file_name
        );

        let count = self.table.len();
        if count > 0 {
            paragraph.push_str("例えば、");
            for (i, template) in self.table.iter().enumerate() {
                if i + 1 == count && count > 1 {
                    paragraph.push_str("そして最後に");
                }
                paragraph.push_str(&template.sentence);
                if i + 1 < count {
                    paragraph.push_str(CONNECTIVES[i % CONNECTIVES.len()]);
                }
            }
            paragraph.push_str("といったことが考えられます。");
        }
        paragraph.push_str("このテキストはテスト目的のものです。");

        paragraph.repeat(self.repeat_count.max(1))
    }
}

/// 全文を句点で分割してセグメント一覧を作成
fn split_segments(text: &str) -> Vec<TranscriptSegment> {
    text.split('。')
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .enumerate()
        .map(|(id, fragment)| TranscriptSegment {
            id,
            text: format!("{}。", fragment),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TranscribeConfig;

    fn transcriber() -> SimulatedTranscriber {
        let config = TranscribeConfig {
            delay_ms: 0,
            language: "ja".to_string(),
            repeat_count: 3,
        };
        SimulatedTranscriber::new(&config, TemplateTable::builtin())
    }

    #[tokio::test]
    async fn dummy_transcript_embeds_all_template_keys() {
        let file = UploadedFile::new("lecture.wav", "audio/wav");
        let transcript = transcriber().transcribe(&file).await.unwrap();

        assert_eq!(transcript.source_file, "lecture.wav");
        assert!(transcript.text.contains("lecture.wav"));
        for template in TemplateTable::builtin().iter() {
            assert!(transcript.text.contains(&template.key));
        }
    }

    #[tokio::test]
    async fn transcript_is_deterministic() {
        let file = UploadedFile::new("lecture.wav", "audio/wav");
        let transcriber = transcriber();

        let first = transcriber.transcribe(&file).await.unwrap();
        let second = transcriber.transcribe(&file).await.unwrap();
        assert_eq!(first.text, second.text);
    }

    #[tokio::test]
    async fn repeat_count_multiplies_text() {
        let config = TranscribeConfig {
            delay_ms: 0,
            language: "ja".to_string(),
            repeat_count: 1,
        };
        let once = SimulatedTranscriber::new(&config, TemplateTable::builtin());

        let file = UploadedFile::new("a.wav", "");
        let single = once.transcribe(&file).await.unwrap();
        let tripled = transcriber().transcribe(&file).await.unwrap();

        assert_eq!(tripled.text, single.text.repeat(3));
        assert_eq!(tripled.segments.len(), single.segments.len() * 3);
    }

    #[test]
    fn segments_are_sentences_with_period() {
        let segments = split_segments("今日は晴れです。明日は雨です。");

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].id, 0);
        assert_eq!(segments[0].text, "今日は晴れです。");
        assert_eq!(segments[1].text, "明日は雨です。");
    }

    #[test]
    fn empty_text_has_no_segments() {
        assert!(split_segments("").is_empty());
    }
}
