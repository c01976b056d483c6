use chrono::{DateTime, Utc};

use crate::feed::Article;

/// Marker the model is instructed to emit; its absence means the response
/// was likely truncated
pub const SECTION_MARKER: &str = "## 今日趋势";

pub const SYSTEM_PROMPT: &str = "你是一个专业的科技新闻编辑，善于总结和归纳新闻要点，\
擅长写出吸引人的标题。请确保生成完整的文章内容，不要中途截断。";

/// Build the single digest prompt embedding every selected article.
pub fn build_prompt(articles: &[Article]) -> String {
    let articles_text = articles
        .iter()
        .map(|article| {
            format!(
                "标题：{}\n来源：{}\n链接：{}\n摘要：{}\n图片：{}",
                article.title, article.source, article.link, article.summary, article.image_url
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "请基于以下新闻生成一篇详尽的AI科技日报，使用Markdown格式。请注意：\n\
1. 只选取与人工智能、机器学习、大语言模型等AI相关的新闻进行报道\n\
2. 如果新闻内容与AI关系不大，请跳过该新闻\n\
3. 确保每条新闻都突出其在AI领域的意义和影响\n\n\
文章结构要求：\n\
- 第一行：> 本文字数：约 xxxx 字，预计阅读时间：xx 分钟\n\
- 重点新闻（3条）：使用引用格式（>），标题使用链接格式 [标题](原文链接)，\
有图片时展示图片，内容至少300字\n\
- 其他新闻（7-8条）：标题使用链接格式，有图片时展示图片，内容至少200字\n\
- 使用分隔线（---）分隔重点新闻和其他新闻\n\
- 最后：{SECTION_MARKER}（简要总结今日AI领域的主要动向，200字左右）\n\n\
新闻信息如下：\n{articles_text}"
    )
}

/// Prepend a word-count / reading-time line when the model left it out.
pub fn ensure_reading_header(content: &str) -> String {
    let head: String = content.chars().take(100).collect();
    if head.contains("本文字数") {
        return content.to_string();
    }

    let char_count = content
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || ('\u{4e00}'..='\u{9fa5}').contains(c))
        .count();
    let read_time = (char_count as f64 / 300.0).round().max(1.0) as usize;

    format!(
        "> 本文字数：约 {} 字，预计阅读时间：{} 分钟\n\n{}",
        char_count, read_time, content
    )
}

/// Trailing attribution block: generating model plus the distinct sources
/// in first-seen order.
pub fn attribution(model: &str, articles: &[Article]) -> String {
    let mut sources: Vec<&str> = Vec::new();
    for article in articles {
        if !sources.contains(&article.source.as_str()) {
            sources.push(&article.source);
        }
    }

    format!(
        "\n\n---\n\n**作者**：{}  \n**文章来源**：{}",
        model,
        sources.join("、")
    )
}

/// Digest title: the run date plus a trivially chosen highlight title
/// (first article wins; this is not a ranking algorithm).
pub fn digest_title(now: DateTime<Utc>, articles: &[Article]) -> String {
    let highlight = articles
        .first()
        .map(|a| a.title.as_str())
        .unwrap_or("今日AI要闻汇总");

    format!("【{}AI日报】{}", now.format("%Y%m%d"), highlight)
}
