//! OCR 文本修复与 URL 提取
//!
//! OCR 常把字符认错 (0/o、1/l、5 混入子域名等)。本模块按固定顺序
//! 修复这些错误，再用正则提取 URL、域名与服务关键词。

use super::keywords;
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// 关键词命中的服务
#[derive(Debug, Clone, Serialize)]
pub struct ServiceMatch {
    /// 服务名称
    pub service: String,
    /// 命中的关键词数
    pub matches: u32,
    /// 命中数 / 字典大小，封顶 1.0
    pub confidence: f32,
}

/// 文本模式命中的内部系统
#[derive(Debug, Clone, Serialize)]
pub struct SystemMatch {
    /// 系统名称
    pub name: String,
    /// 固定置信度
    pub confidence: f32,
}

struct Tables {
    specific: Vec<(Regex, &'static str)>,
    general: Vec<(Regex, &'static str)>,
    url_patterns: Vec<Regex>,
    domain_fallback: Regex,
    bare_domain: Regex,
    trailing_junk: Regex,
    systems: Vec<(&'static str, Regex)>,
}

// 修复表在首次使用时编译一次，模式全部写死，编译不会失败
fn tables() -> &'static Tables {
    static TABLES: OnceLock<Tables> = OnceLock::new();
    TABLES.get_or_init(|| {
        let rule = |pattern: &str, replacement: &'static str| {
            (Regex::new(pattern).expect("静态正则"), replacement)
        };

        Tables {
            specific: vec![
                rule(r"(?i)5docsgoogle\.com", "docs.google.com"),
                rule(r"(?i)5docs\.google\.com", "docs.google.com"),
                rule(r"(?i)docsgoogle\.com", "docs.google.com"),
                rule(r"(?i)(https?://)5([a-zA-Z])", "${1}${2}"),
                rule(r"(?i)5www\.", "www."),
                rule(r"(?i)5mail\.", "mail."),
                rule(r"(?i)5drive\.", "drive."),
                rule(r"(?i)5github\.", "github."),
                rule(r"(?i)5([a-zA-Z]{4,})\.(com|org|net|br|io|gov)", "${1}.${2}"),
                rule(r"(?i)://5([a-zA-Z0-9-]+)\.", "://${1}."),
                rule(r"(?i)://([0-9])([a-zA-Z])", "://${2}"),
                rule(r"(?i)[1038]docs\.", "docs."),
            ],
            general: vec![
                rule(r"[,;]", "."),
                rule(r"[\\|]", "/"),
                rule(r"_", "-"),
                rule(r"(?i)d0cs\.g00gle\.c0m|docs\.g00gle\.c0m|d0cs\.google\.c0m", "docs.google.com"),
                rule(r"(?i)www\.g00gle\.c0m", "www.google.com"),
                rule(r"(?i)github\.c0m", "github.com"),
                rule(r"(?i)stackoverf10w\.c0m|stackoverflow\.c0m", "stackoverflow.com"),
                rule(r"(?i)goog1e", "google"),
                rule(r"(?i)\.c0m", ".com"),
                rule(r"(?i)\.0rg", ".org"),
                rule(r"(?i)\.n3t", ".net"),
                rule(r"(?i)\.i0\b|\.1o\b|\.10\b", ".io"),
                rule(r"(?i)\.6r\b", ".br"),
                rule(r"(?i)htt[p|]s\.//", "https://"),
                rule(r"(?i)https\.//", "https://"),
                rule(r"(?i)https:/([^/])", "https://${1}"),
                rule(r"(?i)http:/([^/:])", "http://${1}"),
            ],
            url_patterns: vec![
                // 完整 URL
                Regex::new(r#"(?i)https?://[^\s<>"{}|\\^`\[\]]+"#).expect("静态正则"),
                // 无协议域名 (限定 TLD)
                Regex::new(&format!(
                    r#"(?i)\b[a-zA-Z0-9-]+\.(?:{})(?:/[^\s<>"{{}}|\\^`\[\]]*)?"#,
                    keywords::KNOWN_TLDS
                ))
                .expect("静态正则"),
            ],
            domain_fallback: Regex::new(r"(?i)([a-zA-Z0-9-]+(?:\.[a-zA-Z0-9-]+)+)")
                .expect("静态正则"),
            bare_domain: Regex::new(r"^[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").expect("静态正则"),
            trailing_junk: Regex::new(r"[^a-zA-Z0-9./:?=&\-_#%]+$").expect("静态正则"),
            systems: keywords::system_patterns()
                .into_iter()
                .map(|(name, pattern)| (name, Regex::new(pattern).expect("静态正则")))
                .collect(),
        }
    })
}

/// 完整的 URL 后处理流水线
///
/// 顺序固定: 去空白 → 特定修复 → 通用字符修复 → 协议重建 → 末尾清理。
/// 对干净输入是恒等变换。
pub fn post_process_url(raw: &str) -> String {
    let t = tables();
    let mut text: String = raw.split_whitespace().collect();

    for (pattern, replacement) in &t.specific {
        text = pattern.replace_all(&text, *replacement).into_owned();
    }
    for (pattern, replacement) in &t.general {
        text = pattern.replace_all(&text, *replacement).into_owned();
    }

    text = reconstruct_url(&text);
    clean_final_url(&text)
}

/// 无协议但以域名开头时补上 https://
fn reconstruct_url(text: &str) -> String {
    let t = tables();
    if !text.starts_with("http://") && !text.starts_with("https://") && t.bare_domain.is_match(text)
    {
        format!("https://{}", text)
    } else {
        text.to_string()
    }
}

/// 去掉末尾的无效字符，协议后的开头杂质一并清理
fn clean_final_url(url: &str) -> String {
    let t = tables();
    let mut cleaned = t.trailing_junk.replace(url, "").into_owned();

    if let Some(pos) = cleaned.find("://") {
        let (protocol, rest) = cleaned.split_at(pos + 3);
        let trimmed = rest.trim_start_matches(|c: char| !c.is_ascii_alphanumeric());
        cleaned = format!("{}{}", protocol, trimmed);
    }

    cleaned
}

/// 从自由文本中提取 URL
///
/// 先做后处理修复，再按完整 URL 与无协议域名两类模式匹配，
/// 结果去重且保持出现顺序。
pub fn extract_urls(text: &str) -> Vec<String> {
    let t = tables();
    let repaired = post_process_text(text);

    let mut urls: Vec<String> = Vec::new();
    for pattern in &t.url_patterns {
        for m in pattern.find_iter(&repaired) {
            let cleaned = clean_final_url(m.as_str().trim());
            if cleaned.len() >= 4 && cleaned.contains('.') && !urls.contains(&cleaned) {
                urls.push(cleaned);
            }
        }
    }
    urls
}

/// 对整段文本做字符级修复 (不做协议重建，避免给普通文本加前缀)
fn post_process_text(raw: &str) -> String {
    let t = tables();
    let mut text = raw.to_string();
    for (pattern, replacement) in &t.specific {
        text = pattern.replace_all(&text, *replacement).into_owned();
    }
    for (pattern, replacement) in &t.general {
        text = pattern.replace_all(&text, *replacement).into_owned();
    }
    text
}

/// 提取 URL 的域名部分，去掉 www. 前缀
///
/// 优先用 URL 解析器，解析失败时退回正则。
pub fn extract_domain(url: &str) -> Option<String> {
    let candidate = if url.contains("://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    };

    if let Ok(parsed) = url::Url::parse(&candidate) {
        if let Some(host) = parsed.host_str() {
            return Some(host.trim_start_matches("www.").to_lowercase());
        }
    }

    let t = tables();
    t.domain_fallback
        .find(url)
        .map(|m| m.as_str().trim_start_matches("www.").to_lowercase())
}

/// 按关键词字典识别服务
///
/// 置信度 = 命中数 / 字典大小，按置信度降序。
pub fn detect_keywords(text: &str) -> Vec<ServiceMatch> {
    let lower = text.to_lowercase();
    let mut services: Vec<ServiceMatch> = keywords::service_keywords()
        .into_iter()
        .filter_map(|(service, words)| {
            let matches = words.iter().filter(|w| lower.contains(*w)).count() as u32;
            if matches > 0 {
                Some(ServiceMatch {
                    service: service.to_string(),
                    matches,
                    confidence: (matches as f32 / words.len() as f32).min(1.0),
                })
            } else {
                None
            }
        })
        .collect();

    services.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    services
}

/// 按文本模式识别内部系统，命中固定 0.8 置信度
pub fn detect_systems(text: &str) -> Vec<SystemMatch> {
    let t = tables();
    t.systems
        .iter()
        .filter(|(_, pattern)| pattern.is_match(text))
        .map(|(name, _)| SystemMatch {
            name: name.to_string(),
            confidence: 0.8,
        })
        .collect()
}

/// 从已知域名映射查服务名
pub fn service_for_domain(domain: &str) -> Option<&'static str> {
    keywords::known_domains()
        .into_iter()
        .find(|(d, _)| *d == domain)
        .map(|(_, s)| s)
}
