//! 文本规范化
//!
//! 将聊天原文按空白切分为 token，逐个改写为可朗读的 SSML 片段，
//! 最后整体包裹在 prosody 标签中。纯函数，无副作用。

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

/// token 改写动作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Replacement {
    /// 丢弃 token
    Drop,
    /// 替换为字面单词
    Word(&'static str),
    /// 替换为音素标注
    Phoneme {
        /// IPA 音标
        ph: &'static str,
        /// 标签内显示文本
        text: &'static str,
    },
}

/// 改写规则表：按顺序匹配，首个命中生效
///
/// 模式不区分大小写，且锚定在 token 开头
pub const REPLACEMENT_RULES: &[(&str, Replacement)] = &[
    (r"<3+$", Replacement::Word("heart")),
    (r"</3$", Replacement::Word("broken heart")),
    (
        r"lo+l[!?.]*$",
        Replacement::Phoneme {
            ph: "ˈɛl ˈoʊ ˈɛl",
            text: "lol",
        },
    ),
    (
        r"lmf?ao+[!?.]*$",
        Replacement::Phoneme {
            ph: "ˈɛl ˈɛm ˈeɪ ˈoʊ",
            text: "lmao",
        },
    ),
    (
        r"xd+$",
        Replacement::Phoneme {
            ph: "ˈɛks ˈdiː",
            text: "xd",
        },
    ),
    (r"rofl[!?.]*$", Replacement::Word("rolling on the floor laughing")),
    (r"brb$", Replacement::Word("be right back")),
    (r"afk$", Replacement::Word("away from keyboard")),
    (r"btw$", Replacement::Word("by the way")),
    (r"imo$", Replacement::Word("in my opinion")),
    (r"tbh$", Replacement::Word("to be honest")),
    (r"idk$", Replacement::Word("I don't know")),
    (r"irl$", Replacement::Word("in real life")),
    (r"omg[!?.]*$", Replacement::Word("oh my god")),
    (r"ty$", Replacement::Word("thank you")),
    (r"np$", Replacement::Word("no problem")),
    (r"gg$", Replacement::Word("good game")),
    (r"\\o/$", Replacement::Word("yay")),
    (r"[:;=][-o']?[()\[\]dpo/\\|*3]+$", Replacement::Drop),
    (r"\^_*\^$", Replacement::Drop),
    (r"-_+-$", Replacement::Drop),
];

/// 编译后的规则表（保持插入顺序）
static COMPILED_RULES: LazyLock<Vec<(Regex, Replacement)>> = LazyLock::new(|| {
    REPLACEMENT_RULES
        .iter()
        .map(|(pattern, replacement)| {
            let regex = Regex::new(&format!("(?i)^(?:{})", pattern))
                .expect("static replacement pattern must compile");
            (regex, *replacement)
        })
        .collect()
});

/// 匹配我们自己生成的 SSML 标签（原文中的 `<` 已被转义）
static MARKUP_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("static tag pattern must compile"));

/// 韵律参数，由调用方提供
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prosody {
    pub rate: String,
    pub pitch: String,
}

impl Prosody {
    pub fn new(rate: impl Into<String>, pitch: impl Into<String>) -> Self {
        Self {
            rate: rate.into(),
            pitch: pitch.into(),
        }
    }
}

/// 规范化配置
#[derive(Debug, Clone)]
pub struct NormalizerConfig {
    /// 结果中没有可打印 ASCII 字符时丢弃整条消息
    ///
    /// 会误伤非拉丁文字的消息，可关闭
    pub drop_non_ascii: bool,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            drop_non_ascii: true,
        }
    }
}

/// 文本规范化器
#[derive(Debug, Clone, Default)]
pub struct TextNormalizer {
    config: NormalizerConfig,
}

impl TextNormalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    /// 将原文转换为 SSML
    ///
    /// 返回 `None` 表示消息没有可朗读的内容，应丢弃
    pub fn normalize(&self, raw: &str, prosody: &Prosody) -> Option<String> {
        let tokens: Vec<String> = raw
            .split_whitespace()
            .map(normalize_token)
            .filter(|t| !t.is_empty())
            .collect();

        if tokens.is_empty() {
            return None;
        }

        let body = tokens.join(" ");
        if self.config.drop_non_ascii && !has_printable_ascii(&body) {
            return None;
        }

        Some(format!(
            r#"<speak><prosody rate="{}" pitch="{}">{}</prosody></speak>"#,
            escape_attribute(&prosody.rate),
            escape_attribute(&prosody.pitch),
            body
        ))
    }
}

/// 改写单个 token
fn normalize_token(token: &str) -> String {
    if is_url_candidate(token) {
        return url_to_speech(token);
    }

    if let Some(replacement) = lookup_replacement(token) {
        return render_replacement(replacement);
    }

    let escaped = escape_markup(&squash_repeats(token));
    match strip_asterisks(&escaped) {
        Some(inner) => emphasize(inner),
        None => escaped,
    }
}

#[inline]
fn is_url_candidate(token: &str) -> bool {
    let lower = token.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// URL 只读主机名；解析失败则丢弃
fn url_to_speech(token: &str) -> String {
    let host = match Url::parse(token) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => match url.host_str() {
            Some(host) => host.to_string(),
            None => return String::new(),
        },
        _ => return String::new(),
    };

    emphasize(&escape_markup(strip_homogeneous_label(&host)))
}

/// 去掉 "www."、"i." 这类由单一字符重复组成的短前缀标签
fn strip_homogeneous_label(host: &str) -> &str {
    let Some((first, rest)) = host.split_once('.') else {
        return host;
    };
    let len = first.chars().count();
    let mut chars = first.chars();
    let homogeneous = match chars.next() {
        Some(c) => chars.all(|other| other == c),
        None => false,
    };

    if (1..=3).contains(&len) && homogeneous && !rest.is_empty() {
        rest
    } else {
        host
    }
}

fn lookup_replacement(token: &str) -> Option<Replacement> {
    COMPILED_RULES
        .iter()
        .find(|(regex, _)| regex.is_match(token))
        .map(|(_, replacement)| *replacement)
}

fn render_replacement(replacement: Replacement) -> String {
    match replacement {
        Replacement::Drop => String::new(),
        Replacement::Word(word) => word.to_string(),
        Replacement::Phoneme { ph, text } => {
            format!(r#"<phoneme alphabet="ipa" ph="{}">{}</phoneme>"#, ph, text)
        }
    }
}

/// 将 3 个及以上连续相同字符压缩为 2 个（"loooool" -> "lool"）
pub fn squash_repeats(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut previous: Option<char> = None;
    let mut run = 0usize;

    for ch in text.chars() {
        if previous == Some(ch) {
            run += 1;
        } else {
            previous = Some(ch);
            run = 1;
        }
        if run <= 2 {
            result.push(ch);
        }
    }

    result
}

/// 转义 SSML 保留字符
pub fn escape_markup(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn escape_attribute(value: &str) -> String {
    escape_markup(value).replace('"', "&quot;")
}

/// `*word*` -> `word`；不足 3 个字符的不处理
fn strip_asterisks(token: &str) -> Option<&str> {
    if token.chars().count() < 3 {
        return None;
    }
    token.strip_prefix('*')?.strip_suffix('*')
}

fn emphasize(text: &str) -> String {
    format!(r#"<emphasis level="strong">{}</emphasis>"#, text)
}

/// 去掉标签后是否还剩可打印 ASCII 字符
fn has_printable_ascii(body: &str) -> bool {
    MARKUP_TAG
        .replace_all(body, "")
        .chars()
        .any(|c| c.is_ascii_graphic())
}
