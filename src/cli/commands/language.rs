use crate::services::detect_language;

pub fn cmd_detect_language(words: &[String]) {
    let text = words.join(" ");
    println!("{}", detect_language(&text));
}
