use Token::*;

/*************\
|* Tokenizer *|
\*************/
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub(super) sigil: String,
    pub(super) mark: char,
    pub(super) content: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    ParenStart,
    ParenEnd,
    Dash,
    Word(String),
    StringLit(Quote),
}

pub fn tokenize(s: &str) -> Vec<Token> {
    let mut tokens: Vec<Token> = vec![];
    let mut current_word: String = "".to_string();
    let mut current_quote: Option<Quote> = None;
    let mut is_escaped: bool = false;
    let mut in_comment: bool = false;

    for char in s.chars() {
        /*******************************\
        |* Comments run to end of line *|
        \*******************************/
        if in_comment {
            in_comment = char != '\n';
            continue;
        }

        /**********************************\
        |* Quoted string literal handling *|
        \**********************************/
        if let Some(mut quote) = current_quote.take() {
            // did we get a matching quote?
            if char == quote.mark {
                if is_escaped {
                    quote.content.push(char);
                    is_escaped = false;
                } else {
                    tokens.push(StringLit(quote));
                    continue;
                }
            } else if is_escaped {
                // if not escaping a quote, treat it as literal slash
                quote.content.push('\\');
                quote.content.push(char);
                is_escaped = false;
            } else if char == '\\' {
                is_escaped = true;
            } else {
                quote.content.push(char);
            }
            current_quote = Some(quote);
        }
        /***************\
        |* Quote start *|
        \***************/
        else if char == '\'' || char == '"' {
            current_quote = Some(Quote {
                sigil: current_word.clone(),
                mark: char,
                content: String::new(),
            });
            current_word.clear();
        }
        // line comment
        else if char == ';' {
            push_word(&mut tokens, &mut current_word);
            in_comment = true;
        }
        /**************************************\
        |* Everything besides string literals *|
        \**************************************/
        else if char == '(' || char == ')' || char.is_whitespace() {
            push_word(&mut tokens, &mut current_word);
            if char == '(' {
                tokens.push(ParenStart)
            } else if char == ')' {
                tokens.push(ParenEnd)
            };
        }
        // leading dashes become the "dash" token
        else if current_word.is_empty() && char == '-' {
            tokens.push(Dash)

        // continue with current identifier
        } else {
            current_word.push(char);
        }
    }
    push_word(&mut tokens, &mut current_word);

    tokens
}

#[inline]
fn push_word(tokens: &mut Vec<Token>, current_word: &mut String) {
    if !current_word.is_empty() {
        tokens.push(Word(current_word.clone()));
        current_word.clear();
    }
}
