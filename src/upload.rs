use anyhow::{bail, Result};
use std::path::Path;

/// アップロードされたファイルの情報
///
/// ブラウザの File オブジェクト相当。メディアタイプは呼び出し元が
/// 申告するもので、空文字列や汎用値のことがある。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadedFile {
    /// ファイル名
    pub file_name: String,

    /// 申告されたメディアタイプ（"audio/wav" など。空でもよい）
    pub media_type: String,
}

impl UploadedFile {
    pub fn new(file_name: impl Into<String>, media_type: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            media_type: media_type.into(),
        }
    }

    /// ファイルパスから作成
    ///
    /// CLIからの入力ではメディアタイプの申告がないため空になる。
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        let file_name = path
            .as_ref()
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::new(file_name, "")
    }

    /// 拡張子を小文字で取得
    ///
    /// ドットを含まないファイル名ではファイル名全体が返る。
    fn extension(&self) -> String {
        self.file_name
            .rsplit('.')
            .next()
            .unwrap_or_default()
            .to_lowercase()
    }
}

/// 受け入れ可能なファイル形式のフィルタ
///
/// `"audio/*,.wav,audio/mpeg"` のようなカンマ区切りの許可リストから
/// 生成する。エントリは3種類:
///
/// - 完全一致のメディアタイプ（`audio/wav`）
/// - ワイルドカード（`audio/*`）
/// - ドット始まりの拡張子（`.wav`）
///
/// # Examples
///
/// ```
/// # use whisper_qa::upload::{AcceptFilter, UploadedFile};
/// let filter = AcceptFilter::parse("audio/*,.wav,.mp3", Some("音声ファイル"));
///
/// assert!(filter.validate(&UploadedFile::new("voice.wav", "audio/wav")).is_ok());
/// assert!(filter.validate(&UploadedFile::new("movie.mp4", "video/mp4")).is_err());
/// ```
#[derive(Clone, Debug)]
pub struct AcceptFilter {
    /// 小文字化した許可エントリの一覧
    allowed: Vec<String>,

    /// 元の許可リスト文字列（エラーメッセージの既定表示用）
    raw: String,

    /// エラーメッセージに表示する形式名
    display_types: Option<String>,
}

impl AcceptFilter {
    /// カンマ区切りの許可リストをパース
    pub fn parse(accepted_types: &str, display_types: Option<&str>) -> Self {
        let allowed = accepted_types
            .split(',')
            .map(|entry| entry.trim().to_lowercase())
            .filter(|entry| !entry.is_empty())
            .collect();
        Self {
            allowed,
            raw: accepted_types.to_string(),
            display_types: display_types.map(str::to_string),
        }
    }

    /// ファイルが許可リストに適合するか検証
    ///
    /// 適合しない場合は期待される形式名を含むエラーを返す。
    /// 許可リストが空の場合はすべて受け入れる。
    ///
    /// # 特例
    ///
    /// `.wav` ファイルはメディアタイプが空や汎用値で申告されることが
    /// あるため、許可リストに音声関連のエントリ（`audio/*`、`audio/wav`、
    /// `.wav` のいずれか）があれば拡張子だけで受け入れる。
    pub fn validate(&self, file: &UploadedFile) -> Result<()> {
        if self.allowed.is_empty() {
            return Ok(());
        }

        let media_type = file.media_type.to_lowercase();
        let extension = file.extension();

        let mut valid = false;
        for allowed in &self.allowed {
            if let Some(ext) = allowed.strip_prefix('.') {
                if extension == ext {
                    valid = true;
                    break;
                }
            } else if let Some(prefix) = allowed.strip_suffix("/*") {
                if media_type.starts_with(prefix) {
                    valid = true;
                    break;
                }
            } else if media_type == *allowed {
                valid = true;
                break;
            }
        }

        if !valid && extension == "wav" {
            let audio_related = ["audio/*", "audio/wav", ".wav"];
            if self
                .allowed
                .iter()
                .any(|entry| audio_related.contains(&entry.as_str()))
            {
                valid = true;
            }
        }

        if !valid {
            log::warn!(
                "無効なファイル形式: {} (メディアタイプ: {:?})",
                file.file_name,
                file.media_type
            );
            bail!(
                "無効なファイル形式です。{} ファイルを選択してください。",
                self.display_types.as_deref().unwrap_or(&self.raw)
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn audio_filter() -> AcceptFilter {
        AcceptFilter::parse(
            "audio/*,.wav,.mp3,.m4a,.ogg,.flac",
            Some("音声ファイル (.wav, .mp3, .m4a など)"),
        )
    }

    #[test]
    fn accepts_exact_media_type() {
        let filter = AcceptFilter::parse("audio/mpeg", None);
        assert!(filter
            .validate(&UploadedFile::new("song.bin", "audio/mpeg"))
            .is_ok());
    }

    #[test]
    fn accepts_wildcard_media_type() {
        let filter = audio_filter();
        assert!(filter
            .validate(&UploadedFile::new("voice.opus", "audio/opus"))
            .is_ok());
    }

    #[test]
    fn accepts_extension_entry() {
        let filter = audio_filter();
        // メディアタイプが合わなくても拡張子で受け入れる
        assert!(filter
            .validate(&UploadedFile::new("voice.mp3", "application/octet-stream"))
            .is_ok());
    }

    #[test]
    fn rejects_unlisted_type() {
        let filter = audio_filter();
        let err = filter
            .validate(&UploadedFile::new("movie.mp4", "video/mp4"))
            .unwrap_err();

        // エラーメッセージには期待される形式名が含まれる
        assert!(err.to_string().contains("音声ファイル"));
    }

    #[test]
    fn rejection_message_falls_back_to_raw_list() {
        let filter = AcceptFilter::parse("audio/*", None);
        let err = filter
            .validate(&UploadedFile::new("movie.mp4", "video/mp4"))
            .unwrap_err();
        assert!(err.to_string().contains("audio/*"));
    }

    #[test]
    fn wav_special_case_with_empty_media_type() {
        let filter = audio_filter();
        assert!(filter
            .validate(&UploadedFile::new("recording.wav", ""))
            .is_ok());

        // 汎用メディアタイプでも受け入れる
        assert!(filter
            .validate(&UploadedFile::new("recording.wav", "application/octet-stream"))
            .is_ok());
    }

    #[test]
    fn wav_special_case_requires_audio_entry() {
        // 許可リストに音声関連のエントリがなければ特例は働かない
        let filter = AcceptFilter::parse("image/*,.png", None);
        assert!(filter
            .validate(&UploadedFile::new("recording.wav", ""))
            .is_err());
    }

    #[test]
    fn matching_is_case_insensitive() {
        let filter = audio_filter();
        assert!(filter
            .validate(&UploadedFile::new("VOICE.WAV", "AUDIO/WAV"))
            .is_ok());
    }

    #[test]
    fn empty_allow_list_accepts_everything() {
        let filter = AcceptFilter::parse("", None);
        assert!(filter
            .validate(&UploadedFile::new("anything.xyz", "application/x-unknown"))
            .is_ok());
    }

    #[test]
    fn from_path_has_empty_media_type() {
        let file = UploadedFile::from_path("/tmp/recordings/lecture.wav");
        assert_eq!(file.file_name, "lecture.wav");
        assert!(file.media_type.is_empty());
    }
}
