//! Whatlang Model - 基于 whatlang 的语言识别
//!
//! 候选语言限定为音色目录中出现的语言前缀。
//! whatlang 使用 ISO 639-3 代码，这里与 ISO 639-1 前缀互相转换。

use std::collections::BTreeSet;
use whatlang::{Detector, Lang};

use crate::application::ports::{LanguageGuess, LanguageModelPort};

/// ISO 639-1 -> ISO 639-3 (whatlang 支持的语言)
const ISO_639_MAP: &[(&str, &str)] = &[
    ("af", "afr"),
    ("ak", "aka"),
    ("am", "amh"),
    ("ar", "ara"),
    ("az", "aze"),
    ("be", "bel"),
    ("bg", "bul"),
    ("bn", "ben"),
    ("ca", "cat"),
    ("cs", "ces"),
    ("da", "dan"),
    ("de", "deu"),
    ("el", "ell"),
    ("en", "eng"),
    ("eo", "epo"),
    ("es", "spa"),
    ("et", "est"),
    ("fa", "pes"),
    ("fi", "fin"),
    ("fr", "fra"),
    ("gu", "guj"),
    ("he", "heb"),
    ("hi", "hin"),
    ("hr", "hrv"),
    ("hu", "hun"),
    ("hy", "hye"),
    ("id", "ind"),
    ("it", "ita"),
    ("ja", "jpn"),
    ("jv", "jav"),
    ("ka", "kat"),
    ("km", "khm"),
    ("kn", "kan"),
    ("ko", "kor"),
    ("la", "lat"),
    ("lt", "lit"),
    ("lv", "lav"),
    ("mk", "mkd"),
    ("ml", "mal"),
    ("mr", "mar"),
    ("my", "mya"),
    ("nb", "nob"),
    ("ne", "nep"),
    ("nl", "nld"),
    ("no", "nob"),
    ("or", "ori"),
    ("pa", "pan"),
    ("pl", "pol"),
    ("pt", "por"),
    ("ro", "ron"),
    ("ru", "rus"),
    ("si", "sin"),
    ("sk", "slk"),
    ("sl", "slv"),
    ("sn", "sna"),
    ("sr", "srp"),
    ("sv", "swe"),
    ("ta", "tam"),
    ("te", "tel"),
    ("th", "tha"),
    ("tk", "tuk"),
    ("tl", "tgl"),
    ("tr", "tur"),
    ("uk", "ukr"),
    ("ur", "urd"),
    ("uz", "uzb"),
    ("vi", "vie"),
    ("yi", "yid"),
    ("zh", "cmn"),
    ("zu", "zul"),
];

/// 前缀可以是 ISO 639-1 或 ISO 639-3（如 Google 的 `cmn`）
fn to_whatlang(prefix: &str) -> Option<Lang> {
    ISO_639_MAP
        .iter()
        .find(|(short, _)| *short == prefix)
        .and_then(|(_, long)| Lang::from_code(*long))
        .or_else(|| Lang::from_code(prefix))
}

fn to_prefix(lang: Lang) -> Option<&'static str> {
    let code = lang.code();
    ISO_639_MAP
        .iter()
        .find(|(_, long)| *long == code)
        .map(|(short, _)| *short)
}

/// whatlang 语言识别模型
pub struct WhatlangModel {
    detector: Detector,
    /// 识别结果 -> 目录中的语言前缀
    prefixes: Vec<(Lang, String)>,
}

impl WhatlangModel {
    /// 以可用语言前缀构造
    ///
    /// 没有任何可识别前缀时退化为全语种识别，结果优先按 ISO 639-1 返回
    pub fn new(languages: &BTreeSet<String>) -> Self {
        let mut prefixes: Vec<(Lang, String)> = Vec::new();
        let mut unsupported: Vec<&String> = Vec::new();
        for prefix in languages {
            match to_whatlang(prefix) {
                Some(lang) if prefixes.iter().any(|(known, _)| *known == lang) => {}
                Some(lang) => prefixes.push((lang, prefix.clone())),
                None => unsupported.push(prefix),
            }
        }
        if !unsupported.is_empty() {
            tracing::debug!(?unsupported, "Languages without a detection model");
        }

        let detector = if prefixes.is_empty() {
            Detector::new()
        } else {
            Detector::with_allowlist(prefixes.iter().map(|(lang, _)| *lang).collect())
        };

        Self { detector, prefixes }
    }

    fn prefix_for(&self, lang: Lang) -> String {
        match self.prefixes.iter().find(|(known, _)| *known == lang) {
            Some((_, prefix)) => prefix.clone(),
            None => to_prefix(lang).unwrap_or(lang.code()).to_string(),
        }
    }
}

impl LanguageModelPort for WhatlangModel {
    fn detect(&self, text: &str) -> Option<LanguageGuess> {
        let info = self.detector.detect(text)?;
        let language = self.prefix_for(info.lang());

        Some(LanguageGuess {
            language,
            confidence: info.confidence(),
        })
    }
}
