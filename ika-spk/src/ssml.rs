//! SSML markup with IPA phonemes for words the provider would mispronounce

use crate::error::SpeechError;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// Word (lowercase) to IPA transcription
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IpaDictionary {
    entries: HashMap<String, String>,
}

impl IpaDictionary {
    pub fn from_json_str(content: &str) -> Result<Self, SpeechError> {
        let raw: HashMap<String, String> = serde_json::from_str(content)
            .map_err(|e| SpeechError::Config(format!("invalid IPA dictionary: {}", e)))?;
        Ok(raw.into_iter().collect())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SpeechError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let dictionary = Self::from_json_str(&content)?;
        info!("Loaded IPA dictionary from {} ({} entries)", path.display(), dictionary.len());
        Ok(dictionary)
    }

    pub fn get(&self, word: &str) -> Option<&str> {
        self.entries.get(&word.trim().to_lowercase()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, String)> for IpaDictionary {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(word, ipa)| (word.trim().to_lowercase(), ipa))
                .collect(),
        }
    }
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

#[derive(Debug, PartialEq, Eq)]
enum Token<'a> {
    Word(&'a str),
    Space(&'a str),
    Other(&'a str),
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        if is_word_char(c) || c.is_whitespace() {
            let word = is_word_char(c);
            let mut end = start + c.len_utf8();
            while let Some(&(idx, next)) = chars.peek() {
                if (word && is_word_char(next)) || (!word && next.is_whitespace()) {
                    end = idx + next.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            let slice = &text[start..end];
            tokens.push(if word { Token::Word(slice) } else { Token::Space(slice) });
        } else {
            tokens.push(Token::Other(&text[start..start + c.len_utf8()]));
        }
    }
    tokens
}

/// `<speak>` markup with `<phoneme alphabet="ipa">` around known words.
/// Unknown words, spacing and punctuation pass through escaped.
pub fn text_to_ssml(text: &str, dictionary: &IpaDictionary) -> String {
    let mut body = String::with_capacity(text.len() + 16);
    for token in tokenize(text) {
        match token {
            Token::Word(word) => match dictionary.get(word) {
                Some(ipa) => {
                    body.push_str(&format!(
                        "<phoneme alphabet=\"ipa\" ph=\"{}\">{}</phoneme>",
                        escape(ipa),
                        escape(word)
                    ));
                }
                None => body.push_str(&escape(word)),
            },
            Token::Space(space) => body.push_str(space),
            Token::Other(other) => body.push_str(&escape(other)),
        }
    }
    format!("<speak>{}</speak>", body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dictionary() -> IpaDictionary {
        vec![("Ya".to_string(), "ja".to_string()), ("mmiri".to_string(), "mːiri".to_string())]
            .into_iter()
            .collect()
    }

    #[test]
    fn escape_covers_xml_specials() {
        assert_eq!(escape("a & b"), "a &amp; b");
        assert_eq!(escape("x < y"), "x &lt; y");
        assert_eq!(escape("say \"hi\""), "say &quot;hi&quot;");
    }

    #[test]
    fn tokenize_keeps_spacing_and_punctuation() {
        assert_eq!(
            tokenize("ya,  oma!"),
            vec![
                Token::Word("ya"),
                Token::Other(","),
                Token::Space("  "),
                Token::Word("oma"),
                Token::Other("!"),
            ]
        );
    }

    #[test]
    fn known_words_get_phonemes() {
        let ssml = text_to_ssml("Ya mmiri", &dictionary());
        assert_eq!(
            ssml,
            "<speak><phoneme alphabet=\"ipa\" ph=\"ja\">Ya</phoneme> <phoneme alphabet=\"ipa\" ph=\"mːiri\">mmiri</phoneme></speak>"
        );
    }

    #[test]
    fn unknown_words_pass_through() {
        let ssml = text_to_ssml("ya xyz", &dictionary());
        assert_eq!(ssml.matches("<phoneme").count(), 1);
        assert!(ssml.contains(" xyz</speak>"));
    }

    #[test]
    fn markup_in_text_is_escaped() {
        assert_eq!(text_to_ssml("a & <b>", &IpaDictionary::default()), "<speak>a &amp; &lt;b&gt;</speak>");
    }

    #[test]
    fn empty_text_gives_empty_speak() {
        assert_eq!(text_to_ssml("", &dictionary()), "<speak></speak>");
    }
}
