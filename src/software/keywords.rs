//! 关键词与域名静态表
//!
//! 各在线服务的关键词字典 (含葡语界面词)、已知域名到服务的映射、
//! 域名提取用的 TLD 列表以及内部系统的文本模式。

/// 服务关键词字典
pub fn service_keywords() -> Vec<(&'static str, Vec<&'static str>)> {
    vec![
        (
            "YouTube",
            vec![
                "youtube", "youtube.com", "youtu.be", "watch?v=", "subscribe", "inscrever-se",
                "like", "curtir", "share", "compartilhar", "comments", "comentários",
                "views", "visualizações", "upload", "playlist", "channel", "canal",
            ],
        ),
        (
            "Google",
            vec![
                "google", "google.com", "search", "pesquisar", "gmail", "drive",
                "maps", "mapas", "images", "imagens", "news", "notícias",
            ],
        ),
        (
            "Facebook",
            vec![
                "facebook", "facebook.com", "fb.com", "like", "curtir", "share",
                "compartilhar", "comment", "comentar", "post", "timeline", "feed",
            ],
        ),
        (
            "Instagram",
            vec![
                "instagram", "instagram.com", "stories", "reels", "igtv", "follow",
                "seguir", "followers", "seguidores", "following", "seguindo",
            ],
        ),
        (
            "Twitter",
            vec![
                "twitter", "twitter.com", "x.com", "tweet", "retweet", "like",
                "follow", "followers", "following", "trending", "hashtag",
            ],
        ),
        (
            "LinkedIn",
            vec![
                "linkedin", "linkedin.com", "connect", "conectar", "network",
                "professional", "job", "career", "experience", "skills",
            ],
        ),
        (
            "WhatsApp",
            vec![
                "whatsapp", "whatsapp.com", "chat", "message", "mensagem",
                "online", "last seen", "visto por último", "typing", "digitando",
            ],
        ),
        (
            "Telegram",
            vec![
                "telegram", "telegram.org", "t.me", "channel", "canal", "group",
                "grupo", "forward", "encaminhar", "reply", "responder",
            ],
        ),
        (
            "Discord",
            vec![
                "discord", "discord.com", "server", "servidor", "channel", "canal",
                "voice", "voz", "text", "texto", "online", "offline",
            ],
        ),
        (
            "Steam",
            vec![
                "steam", "steampowered.com", "library", "biblioteca", "store",
                "loja", "community", "comunidade", "workshop", "friends", "amigos",
            ],
        ),
        (
            "Netflix",
            vec![
                "netflix", "netflix.com", "watch", "assistir", "my list",
                "minha lista", "continue watching", "continuar assistindo", "episodes",
            ],
        ),
        (
            "Amazon",
            vec![
                "amazon", "amazon.com", "prime", "cart", "carrinho", "buy now",
                "comprar agora", "add to cart", "adicionar ao carrinho", "wishlist",
            ],
        ),
        (
            "Microsoft",
            vec![
                "microsoft", "microsoft.com", "outlook", "office", "teams",
                "onedrive", "xbox", "windows", "bing",
            ],
        ),
        (
            "Apple",
            vec![
                "apple", "apple.com", "icloud", "app store", "itunes", "safari",
                "mac", "iphone", "ipad",
            ],
        ),
    ]
}

/// 已知域名到服务名的映射
pub fn known_domains() -> Vec<(&'static str, &'static str)> {
    vec![
        ("google.com", "Google"),
        ("youtube.com", "YouTube"),
        ("facebook.com", "Facebook"),
        ("instagram.com", "Instagram"),
        ("twitter.com", "Twitter/X"),
        ("x.com", "Twitter/X"),
        ("whatsapp.com", "WhatsApp"),
        ("discord.com", "Discord"),
        ("telegram.org", "Telegram"),
        ("github.com", "GitHub"),
        ("stackoverflow.com", "Stack Overflow"),
        ("reddit.com", "Reddit"),
        ("linkedin.com", "LinkedIn"),
        ("amazon.com", "Amazon"),
        ("netflix.com", "Netflix"),
        ("spotify.com", "Spotify"),
        ("twitch.tv", "Twitch"),
        ("steam.com", "Steam"),
        ("microsoft.com", "Microsoft"),
        ("apple.com", "Apple"),
    ]
}

/// 内部系统的文本模式 (命中即以固定置信度报告)
pub fn system_patterns() -> Vec<(&'static str, &'static str)> {
    vec![
        ("Redmine", r"(?i)redmine"),
        ("UDS", r"(?i)uds|udstec"),
        ("Credishop", r"(?i)credishop"),
        ("GitHub", r"(?i)github"),
        ("GitLab", r"(?i)gitlab"),
        ("Jira", r"(?i)jira|atlassian"),
        ("Slack", r"(?i)slack"),
        ("Teams", r"(?i)teams\.microsoft"),
        ("Google", r"(?i)google"),
        ("YouTube", r"(?i)youtube"),
    ]
}

/// 无协议域名提取接受的 TLD
pub const KNOWN_TLDS: &str = "com|org|net|edu|gov|mil|int|co|io|me|tv|info|biz|name|pro|museum|aero|coop|jobs|travel|mobi|asia|cat|tel|xxx|post|geo|local|localhost|br";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fourteen_services() {
        assert_eq!(service_keywords().len(), 14);
    }

    #[test]
    fn test_keywords_are_lowercase() {
        // 关键词匹配按小写进行，字典必须预先小写
        for (_, words) in service_keywords() {
            for w in words {
                assert_eq!(w, w.to_lowercase());
            }
        }
    }

    #[test]
    fn test_known_domains_cover_major_services() {
        let domains = known_domains();
        assert!(domains.iter().any(|(d, s)| *d == "github.com" && *s == "GitHub"));
        assert!(domains.iter().any(|(d, s)| *d == "x.com" && *s == "Twitter/X"));
    }

    #[test]
    fn test_system_patterns_compile() {
        for (_, pattern) in system_patterns() {
            assert!(regex::Regex::new(pattern).is_ok());
        }
    }
}
