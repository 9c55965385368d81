//! Incremental, byte-driven lexer.
//!
//! Unlike a conventional whole-buffer lexer (the shape `logos` gives you,
//! and the shape this dialect's predecessor lexers in this repo used),
//! this one is designed to be fed arbitrary, possibly tiny, slices of the
//! source and to resume exactly where it left off — including mid-token,
//! mid-escape, or mid-exponent. All of that resumption state lives on
//! `Lexer` itself; there is no "rest of the buffer" to fall back on.
//!
//! The lexer does not return a token stream. It calls into a [`Sink`]
//! (implemented by the parser) once per token, synchronously, from
//! inside [`Lexer::feed`]. This mirrors the source's callback-table
//! design (see the crate-level docs) as a plain trait instead of a
//! struct of function pointers.

use span::Span;

/// One lexeme handed to the [`Sink`]. `Bridge` and `EndOfStatement` are
/// synthetic: the lexer inserts them at statement/field boundaries, they
/// never correspond to literal source characters.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
  Identifier(String),
  Str(String),
  Int(i64),
  Float(f64),
  Keyword(Keyword),
  Bridge,
  EndOfStatement,
}

/// Keyword and punctuation ids. `{` and `}` are included here (not
/// handled as invisible structural characters) because the field
/// grammar treats them as literal terminals: `field = "{" expr "}"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
  Or,
  And,
  If,
  Else,
  True,
  False,
  Inf,
  Nan,
  LParen,
  RParen,
  LBracket,
  RBracket,
  LBrace,
  RBrace,
  Comma,
  Dot,
  Eq,
  Concat,
  Plus,
  Minus,
  Star,
  Slash,
  Percent,
  Pow,
  Bang,
  Lt,
  Gt,
  Le,
  Ge,
}

/// Callbacks invoked by the lexer. Returning `false` from [`Sink::token`]
/// moves the lexer into its error-recovery state, discarding the rest of
/// the current statement — this is how a host can abort a pathological
/// statement without tearing down the whole pipeline.
pub trait Sink {
  fn token(&mut self, token: Token, span: Span) -> bool;
  /// A lexical error was detected at `span`. The lexer has already
  /// decided to enter recovery; this call exists purely to deliver the
  /// message (a no-payload `Error` marker follows as the next `token`).
  fn error(&mut self, message: String, span: Span);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Base {
  Bin,
  Oct,
  Dec,
  Hex,
}

impl Base {
  fn radix(self) -> u32 {
    match self {
      Base::Bin => 2,
      Base::Oct => 8,
      Base::Dec => 10,
      Base::Hex => 16,
    }
  }
}

#[derive(Debug, Clone, Copy)]
enum State {
  /// Start of a line: optional `N<digits>`, comment, blank, or a field.
  Newline,
  /// Just consumed `N`; deciding whether this is a line number or a word
  /// that happens to start with `n`/`N`.
  MaybeLineNo,
  /// Consuming the digits of a line number.
  LineNoDigits,
  /// Just past a line number: whitespace, comment, or a field.
  AfterLineNo,
  /// Between fields.
  Stmt,
  /// Inside a literal word.
  Word,
  /// Trailing `; ...` comment, consumed to end of line.
  Comment,
  /// `{...}`: dispatches on character class to the sub-states below.
  Expr,
  /// Just past `}`: decides whether to bridge into a following word or
  /// expression, or return to `Stmt`.
  AfterExpr,
  /// Consuming a maximal run of operator characters.
  Symbol,
  /// Consuming `[A-Za-z0-9_$]*` after an identifier-starting character.
  Ident,
  /// Inside a `"..."` string.
  Str,
  StrEscape,
  StrOctal { acc: u32, count: u8 },
  StrHex { acc: u32, count: u8 },
  StrUnicode { acc: u32, count: u8, need: u8 },
  /// Just consumed `.`; looking one character ahead to decide between the
  /// member operator and a leading-dot float (`.5`).
  DotMaybe,
  NumZero,
  NumDecimal,
  NumDecimalFrac,
  NumDecimalExpSign,
  NumDecimalExp { digits: u8 },
  NumHexDigits { any: bool },
  NumHexFrac,
  NumHexExpSign,
  NumHexExp { digits: u8 },
  NumOctalDigits,
  NumBinDigits,
  /// Swallow everything to the next newline, then resume at `Newline`.
  Error,
}

/// Incremental lexer. `feed` may be called with any split of the input,
/// including empty slices; `finish` flushes whatever statement is still
/// open.
pub struct Lexer {
  state: State,
  pos: usize,
  token_start: usize,
  buf: String,
  str_buf: String,
  num_base: Base,
  num_is_float: bool,
  /// Leftover bytes of a UTF-8 sequence split across two `feed` calls.
  partial: Vec<u8>,
}

impl Default for Lexer {
  fn default() -> Self {
    Self::new()
  }
}

impl Lexer {
  pub fn new() -> Self {
    Lexer {
      state: State::Newline,
      pos: 0,
      token_start: 0,
      buf: String::new(),
      str_buf: String::new(),
      num_base: Base::Dec,
      num_is_float: false,
      partial: Vec::new(),
    }
  }

  pub fn reset(&mut self) {
    *self = Lexer::new();
  }

  /// Feed a chunk of input, possibly split mid-token or mid-character.
  pub fn feed(&mut self, sink: &mut impl Sink, bytes: &[u8]) {
    let mut input = bytes;
    if !self.partial.is_empty() {
      // try to complete the pending sequence a byte at a time.
      while !input.is_empty() && self.partial.len() < 4 {
        self.partial.push(input[0]);
        input = &input[1..];
        if let Ok(s) = std::str::from_utf8(&self.partial) {
          if let Some(c) = s.chars().next() {
            self.partial.clear();
            self.step(sink, c);
            break;
          }
        }
      }
    }
    let mut rest = input;
    loop {
      match std::str::from_utf8(rest) {
        Ok(s) => {
          for c in s.chars() {
            self.step(sink, c);
          }
          return;
        }
        Err(e) => {
          let valid_len = e.valid_up_to();
          let valid = &rest[..valid_len];
          for c in valid.chars() {
            self.step(sink, c);
          }
          let remainder = &rest[valid_len..];
          match e.error_len() {
            Some(bad_len) => {
              // A genuinely invalid byte sequence mid-stream; treat as
              // a single lexical error and skip it rather than wedging.
              let span = Span { start: self.pos, end: self.pos + bad_len };
              self.report(sink, "invalid UTF-8 in source", span);
              self.pos += bad_len;
              rest = &remainder[bad_len..];
              continue;
            }
            None => {
              // Incomplete sequence at the end of this chunk: stash it
              // for the next `feed` call, to be completed once more
              // bytes arrive.
              self.partial.extend_from_slice(remainder);
              return;
            }
          }
        }
      }
    }
  }

  /// Flush any statement still open, as if a trailing newline had been
  /// seen. Idempotent when the lexer is already at a line boundary.
  ///
  /// A synthetic newline resolves everything a real one would (a word,
  /// a number, a trailing comment) except an `Expr` still waiting on a
  /// closing `}`: newline is ordinary whitespace inside an expression,
  /// so an unclosed brace would otherwise swallow end-of-input forever
  /// and never surface the statement it belongs to. Treat that case as
  /// its own lexical error instead of silently dropping the statement.
  pub fn finish(&mut self, sink: &mut impl Sink) {
    if !matches!(self.state, State::Newline) {
      self.step(sink, '\n');
    }
    if !matches!(self.state, State::Newline) {
      let pos = self.pos;
      self.report(sink, "unexpected end of input", Span { start: pos, end: pos });
      sink.token(Token::EndOfStatement, Span { start: pos, end: pos });
      self.state = State::Newline;
    }
  }

  fn step(&mut self, sink: &mut impl Sink, c: char) {
    let start_pos = self.pos;
    loop {
      match self.dispatch(sink, c, start_pos) {
        Dispatch::Consumed => break,
        Dispatch::Reprocess => continue,
      }
    }
    self.pos += c.len_utf8();
  }

  fn emit(&mut self, sink: &mut impl Sink, token: Token, span: Span) -> bool {
    if !sink.token(token, span) {
      self.enter_error_state();
      false
    } else {
      true
    }
  }

  fn enter_error_state(&mut self) {
    self.state = State::Error;
    self.buf.clear();
    self.str_buf.clear();
  }

  fn report(&mut self, sink: &mut impl Sink, message: impl Into<String>, span: Span) {
    sink.error(message.into(), span);
    self.enter_error_state();
  }

  fn dispatch(&mut self, sink: &mut impl Sink, c: char, pos: usize) -> Dispatch {
    use Dispatch::*;
    match self.state {
      State::Error => {
        if c == '\n' {
          self.state = State::Newline;
          sink.token(Token::EndOfStatement, Span { start: pos, end: pos + 1 });
        }
        Consumed
      }
      State::Newline => {
        if c == ' ' || c == '\t' || c == '\r' {
          Consumed
        } else if c == '\n' {
          sink.token(Token::EndOfStatement, Span { start: pos, end: pos + 1 });
          Consumed
        } else if c == ';' {
          self.state = State::Comment;
          Consumed
        } else if c == 'n' || c == 'N' {
          self.token_start = pos;
          self.state = State::MaybeLineNo;
          Consumed
        } else {
          self.state = State::Stmt;
          Reprocess
        }
      }
      State::MaybeLineNo => {
        if c.is_ascii_digit() {
          self.state = State::LineNoDigits;
          Consumed
        } else {
          // It wasn't a line number: the `n`/`N` we already swallowed is
          // the first character of an ordinary word.
          self.buf.clear();
          self.buf.push('N');
          self.state = State::Word;
          Reprocess
        }
      }
      State::LineNoDigits => {
        if c.is_ascii_digit() {
          Consumed
        } else {
          self.state = State::AfterLineNo;
          Reprocess
        }
      }
      State::AfterLineNo => {
        if c == ' ' || c == '\t' || c == '\r' {
          Consumed
        } else if c == '\n' {
          sink.token(Token::EndOfStatement, Span { start: pos, end: pos + 1 });
          self.state = State::Newline;
          Consumed
        } else if c == ';' {
          self.state = State::Comment;
          Consumed
        } else {
          self.state = State::Stmt;
          Reprocess
        }
      }
      State::Comment => {
        if c == '\n' {
          sink.token(Token::EndOfStatement, Span { start: pos, end: pos + 1 });
          self.state = State::Newline;
        }
        Consumed
      }
      State::Stmt => {
        if c == ' ' || c == '\t' || c == '\r' {
          Consumed
        } else if c == '\n' {
          sink.token(Token::EndOfStatement, Span { start: pos, end: pos + 1 });
          self.state = State::Newline;
          Consumed
        } else if c == ';' {
          self.state = State::Comment;
          Consumed
        } else if c == '{' {
          if self.emit(sink, Token::Keyword(Keyword::LBrace), Span { start: pos, end: pos + 1 }) {
            self.state = State::Expr;
          }
          Consumed
        } else {
          self.token_start = pos;
          self.buf.clear();
          self.buf.extend(c.to_uppercase());
          self.state = State::Word;
          Consumed
        }
      }
      State::Word => {
        if c == ' ' || c == '\t' || c == '\r' || c == '\n' || c == ';' {
          let span = Span { start: self.token_start, end: pos };
          if self.emit(sink, Token::Str(std::mem::take(&mut self.buf)), span) {
            self.state = State::Stmt;
          }
          Reprocess
        } else if c == '{' {
          let span = Span { start: self.token_start, end: pos };
          if self.emit(sink, Token::Str(std::mem::take(&mut self.buf)), span)
            && self.emit(sink, Token::Bridge, Span { start: pos, end: pos })
            && self.emit(sink, Token::Keyword(Keyword::LBrace), Span { start: pos, end: pos + 1 })
          {
            self.state = State::Expr;
          }
          Consumed
        } else {
          self.buf.extend(c.to_uppercase());
          Consumed
        }
      }
      State::AfterExpr => {
        if c == ' ' || c == '\t' || c == '\r' || c == '\n' || c == ';' {
          self.state = State::Stmt;
          Reprocess
        } else if is_ident_continue(c) {
          if self.emit(sink, Token::Bridge, Span { start: pos, end: pos }) {
            self.token_start = pos;
            self.buf.clear();
            self.state = State::Word;
          }
          Reprocess
        } else if c == '{' {
          if self.emit(sink, Token::Bridge, Span { start: pos, end: pos }) {
            self.state = State::Expr;
          }
          Reprocess
        } else {
          self.state = State::Stmt;
          Reprocess
        }
      }
      State::Expr => self.dispatch_expr(sink, c, pos),
      State::DotMaybe => {
        if c.is_ascii_digit() {
          self.buf.clear();
          self.buf.push_str("0.");
          self.buf.push(c);
          self.num_base = Base::Dec;
          self.num_is_float = true;
          self.state = State::NumDecimalFrac;
          Consumed
        } else {
          if self.emit(
            sink,
            Token::Keyword(Keyword::Dot),
            Span { start: self.token_start, end: self.token_start + 1 },
          ) {
            self.state = State::Expr;
          }
          Reprocess
        }
      }
      State::Symbol => {
        if is_symbol_char(c) {
          self.buf.push(c);
          Consumed
        } else {
          if self.finish_symbol_run(sink, pos) {
            self.state = State::Expr;
          }
          Reprocess
        }
      }
      State::Ident => {
        if is_ident_continue(c) {
          self.buf.extend(c.to_uppercase());
          Consumed
        } else {
          self.finish_ident(sink, pos);
          Reprocess
        }
      }
      State::Str => {
        if c == '"' {
          let span = Span { start: self.token_start, end: pos + 1 };
          if self.emit(sink, Token::Str(std::mem::take(&mut self.str_buf)), span) {
            self.state = State::Expr;
          }
          Consumed
        } else if c == '\\' {
          self.state = State::StrEscape;
          Consumed
        } else if c == '\n' {
          self.report(sink, "unterminated string", Span { start: self.token_start, end: pos });
          // Reprocess the newline itself through `Error`, so this same
          // character both ends the malformed statement and starts the
          // next line, instead of requiring a second newline to recover.
          Reprocess
        } else {
          self.str_buf.push(c);
          Consumed
        }
      }
      State::StrEscape => {
        self.dispatch_str_escape(sink, c, pos)
      }
      State::StrOctal { acc, count } => self.dispatch_str_octal(sink, c, pos, acc, count),
      State::StrHex { acc, count } => self.dispatch_str_hex(sink, c, pos, acc, count),
      State::StrUnicode { acc, count, need } => {
        self.dispatch_str_unicode(sink, c, pos, acc, count, need)
      }
      State::NumZero => self.dispatch_num_zero(sink, c, pos),
      State::NumDecimal => self.dispatch_num_decimal(sink, c, pos),
      State::NumDecimalFrac => self.dispatch_num_decimal_frac(sink, c, pos),
      State::NumDecimalExpSign => self.dispatch_num_decimal_exp_sign(sink, c, pos),
      State::NumDecimalExp { digits } => self.dispatch_num_decimal_exp(sink, c, pos, digits),
      State::NumHexDigits { any } => self.dispatch_num_hex_digits(sink, c, pos, any),
      State::NumHexFrac => self.dispatch_num_hex_frac(sink, c, pos),
      State::NumHexExpSign => self.dispatch_num_hex_exp_sign(sink, c, pos),
      State::NumHexExp { digits } => self.dispatch_num_hex_exp(sink, c, pos, digits),
      State::NumOctalDigits => self.dispatch_num_octal(sink, c, pos),
      State::NumBinDigits => self.dispatch_num_bin(sink, c, pos),
    }
  }

  fn dispatch_expr(&mut self, sink: &mut impl Sink, c: char, pos: usize) -> Dispatch {
    use Dispatch::*;
    if c == ' ' || c == '\t' || c == '\r' || c == '\n' {
      Consumed
    } else if c == '"' {
      self.token_start = pos;
      self.str_buf.clear();
      self.state = State::Str;
      Consumed
    } else if c == '{' {
      self.emit(sink, Token::Keyword(Keyword::LBrace), Span { start: pos, end: pos + 1 });
      Consumed
    } else if c == '}' {
      if self.emit(sink, Token::Keyword(Keyword::RBrace), Span { start: pos, end: pos + 1 }) {
        self.state = State::AfterExpr;
      }
      Consumed
    } else if c.is_ascii_digit() {
      self.token_start = pos;
      self.buf.clear();
      self.buf.push(c);
      if c == '0' {
        self.num_base = Base::Dec;
        self.state = State::NumZero;
      } else {
        self.num_base = Base::Dec;
        self.num_is_float = false;
        self.state = State::NumDecimal;
      }
      Consumed
    } else if c == '.' {
      self.token_start = pos;
      self.state = State::DotMaybe;
      Consumed
    } else if is_ident_start(c) {
      self.token_start = pos;
      self.buf.clear();
      self.buf.extend(c.to_uppercase());
      self.state = State::Ident;
      Consumed
    } else if is_symbol_char(c) {
      self.token_start = pos;
      self.buf.clear();
      self.buf.push(c);
      self.state = State::Symbol;
      Consumed
    } else {
      self.report(sink, format!("unexpected character `{c}`"), Span { start: pos, end: pos + c.len_utf8() });
      Consumed
    }
  }

  fn finish_ident(&mut self, sink: &mut impl Sink, pos: usize) {
    let span = Span { start: self.token_start, end: pos };
    let word = std::mem::take(&mut self.buf);
    let token = match word.as_str() {
      "OR" => Token::Keyword(Keyword::Or),
      "AND" => Token::Keyword(Keyword::And),
      "IF" => Token::Keyword(Keyword::If),
      "ELSE" => Token::Keyword(Keyword::Else),
      "TRUE" => Token::Keyword(Keyword::True),
      "FALSE" => Token::Keyword(Keyword::False),
      "INF" => Token::Keyword(Keyword::Inf),
      "NAN" => Token::Keyword(Keyword::Nan),
      _ => Token::Identifier(word),
    };
    if self.emit(sink, token, span) {
      self.state = State::Expr;
    }
  }

  /// Returns whether the run was fully accepted: `false` means either a
  /// lexical error or a sink rejection already moved the lexer to
  /// `Error`, and the caller must not overwrite that state.
  fn finish_symbol_run(&mut self, sink: &mut impl Sink, end_pos: usize) -> bool {
    let run = std::mem::take(&mut self.buf);
    let mut offset = 0usize;
    let mut start = self.token_start;
    let bytes = run.as_bytes();
    while offset < bytes.len() {
      let rest = &run[offset..];
      if let Some((len, kw)) = match_two_char(rest).or_else(|| match_one_char(rest)) {
        let span = Span { start, end: start + len };
        if !self.emit(sink, Token::Keyword(kw), span) {
          return false;
        }
        offset += len;
        start += len;
      } else {
        let ch = rest.chars().next().unwrap();
        let clen = ch.len_utf8();
        self.report(
          sink,
          format!("unknown operator `{ch}`"),
          Span { start, end: start + clen },
        );
        return false;
      }
    }
    debug_assert_eq!(start, end_pos);
    true
  }

  fn dispatch_str_escape(&mut self, sink: &mut impl Sink, c: char, pos: usize) -> Dispatch {
    use Dispatch::*;
    let simple = match c {
      'a' => Some('\u{07}'),
      'b' => Some('\u{08}'),
      'e' | 'E' => Some('\u{1B}'),
      'f' => Some('\u{0C}'),
      'n' => Some('\n'),
      'r' => Some('\r'),
      't' => Some('\t'),
      'v' => Some('\u{0B}'),
      '\\' => Some('\\'),
      '\'' => Some('\''),
      '"' => Some('"'),
      '?' => Some('?'),
      _ => None,
    };
    if let Some(ch) = simple {
      self.str_buf.push(ch);
      self.state = State::Str;
      return Consumed;
    }
    match c {
      '0'..='7' => {
        let d = c.to_digit(8).unwrap();
        self.state = State::StrOctal { acc: d, count: 1 };
        Consumed
      }
      'x' => {
        self.state = State::StrHex { acc: 0, count: 0 };
        Consumed
      }
      'u' => {
        self.state = State::StrUnicode { acc: 0, count: 0, need: 4 };
        Consumed
      }
      'U' => {
        self.state = State::StrUnicode { acc: 0, count: 0, need: 8 };
        Consumed
      }
      _ => {
        self.report(sink, "invalid escape sequence", Span { start: pos.saturating_sub(1), end: pos + 1 });
        Consumed
      }
    }
  }

  fn dispatch_str_octal(&mut self, sink: &mut impl Sink, c: char, pos: usize, acc: u32, count: u8) -> Dispatch {
    use Dispatch::*;
    if ('0'..='7').contains(&c) && count < 3 {
      let acc = acc * 8 + c.to_digit(8).unwrap();
      self.state = State::StrOctal { acc, count: count + 1 };
      Consumed
    } else {
      if let Some(ch) = char::from_u32(acc) {
        self.str_buf.push(ch);
        self.state = State::Str;
      } else {
        self.report(sink, "invalid octal escape", Span { start: pos, end: pos + 1 });
        return Consumed;
      }
      Reprocess
    }
  }

  fn dispatch_str_hex(&mut self, sink: &mut impl Sink, c: char, pos: usize, acc: u32, count: u8) -> Dispatch {
    use Dispatch::*;
    if let Some(d) = c.to_digit(16) {
      let acc = acc * 16 + d;
      if count + 1 == 2 {
        if let Some(ch) = char::from_u32(acc) {
          self.str_buf.push(ch);
        }
        self.state = State::Str;
      } else {
        self.state = State::StrHex { acc, count: count + 1 };
      }
      Consumed
    } else {
      self.report(sink, "invalid hex escape, expected 2 hex digits", Span { start: pos, end: pos + 1 });
      Consumed
    }
  }

  fn dispatch_str_unicode(
    &mut self,
    sink: &mut impl Sink,
    c: char,
    pos: usize,
    acc: u32,
    count: u8,
    need: u8,
  ) -> Dispatch {
    use Dispatch::*;
    if let Some(d) = c.to_digit(16) {
      let acc = acc * 16 + d;
      if count + 1 == need {
        if need == 8 && acc > 0x10FFFF {
          self.report(sink, "unicode escape out of range", Span { start: pos.saturating_sub(7), end: pos + 1 });
          return Consumed;
        }
        match char::from_u32(acc) {
          Some(ch) => self.str_buf.push(ch),
          None => {
            self.report(sink, "invalid unicode escape", Span { start: pos.saturating_sub(need as usize), end: pos + 1 });
            return Consumed;
          }
        }
        self.state = State::Str;
      } else {
        self.state = State::StrUnicode { acc, count: count + 1, need };
      }
      Consumed
    } else {
      self.report(
        sink,
        format!("invalid unicode escape, expected {need} hex digits"),
        Span { start: pos, end: pos + 1 },
      );
      Consumed
    }
  }

  fn dispatch_num_zero(&mut self, sink: &mut impl Sink, c: char, pos: usize) -> Dispatch {
    use Dispatch::*;
    match c {
      'x' | 'X' => {
        self.buf.push(c);
        self.num_base = Base::Hex;
        self.state = State::NumHexDigits { any: false };
        Consumed
      }
      'b' | 'B' => {
        self.buf.push(c);
        self.num_base = Base::Bin;
        self.state = State::NumBinDigits;
        Consumed
      }
      '0'..='7' => {
        self.buf.push(c);
        self.num_base = Base::Oct;
        self.state = State::NumOctalDigits;
        Consumed
      }
      '8' | '9' => {
        self.report(sink, "invalid digit in octal literal", Span { start: pos, end: pos + 1 });
        Consumed
      }
      '.' => {
        self.buf.push(c);
        self.num_base = Base::Dec;
        self.num_is_float = true;
        self.state = State::NumDecimalFrac;
        Consumed
      }
      'e' | 'E' => {
        self.buf.push(c);
        self.num_base = Base::Dec;
        self.num_is_float = true;
        self.state = State::NumDecimalExpSign;
        Consumed
      }
      _ => {
        self.finish_number(sink, pos);
        Reprocess
      }
    }
  }

  fn dispatch_num_decimal(&mut self, sink: &mut impl Sink, c: char, pos: usize) -> Dispatch {
    use Dispatch::*;
    if c.is_ascii_digit() {
      self.buf.push(c);
      Consumed
    } else if c == '.' {
      self.buf.push(c);
      self.num_is_float = true;
      self.state = State::NumDecimalFrac;
      Consumed
    } else if c == 'e' || c == 'E' {
      self.buf.push(c);
      self.num_is_float = true;
      self.state = State::NumDecimalExpSign;
      Consumed
    } else {
      self.finish_number(sink, pos);
      Reprocess
    }
  }

  fn dispatch_num_decimal_frac(&mut self, sink: &mut impl Sink, c: char, pos: usize) -> Dispatch {
    use Dispatch::*;
    if c.is_ascii_digit() {
      self.buf.push(c);
      Consumed
    } else if c == 'e' || c == 'E' {
      self.buf.push(c);
      self.state = State::NumDecimalExpSign;
      Consumed
    } else {
      self.finish_number(sink, pos);
      Reprocess
    }
  }

  fn dispatch_num_decimal_exp_sign(&mut self, sink: &mut impl Sink, c: char, pos: usize) -> Dispatch {
    use Dispatch::*;
    if c == '+' || c == '-' {
      self.buf.push(c);
      self.state = State::NumDecimalExp { digits: 0 };
      Consumed
    } else if c.is_ascii_digit() {
      self.buf.push(c);
      self.state = State::NumDecimalExp { digits: 1 };
      Consumed
    } else {
      self.report(sink, "malformed exponent", Span { start: pos, end: pos + 1 });
      Consumed
    }
  }

  fn dispatch_num_decimal_exp(&mut self, sink: &mut impl Sink, c: char, pos: usize, digits: u8) -> Dispatch {
    use Dispatch::*;
    if c.is_ascii_digit() {
      if digits >= 3 {
        self.report(sink, "exponent too long (max 3 digits)", Span { start: pos, end: pos + 1 });
        return Consumed;
      }
      self.buf.push(c);
      self.state = State::NumDecimalExp { digits: digits + 1 };
      Consumed
    } else if digits == 0 {
      self.report(sink, "malformed exponent", Span { start: pos, end: pos + 1 });
      Consumed
    } else {
      self.finish_number(sink, pos);
      Reprocess
    }
  }

  fn dispatch_num_hex_digits(&mut self, sink: &mut impl Sink, c: char, pos: usize, any: bool) -> Dispatch {
    use Dispatch::*;
    if c.is_ascii_hexdigit() {
      self.buf.push(c);
      self.state = State::NumHexDigits { any: true };
      Consumed
    } else if c == '.' {
      self.buf.push(c);
      self.num_is_float = true;
      self.state = State::NumHexFrac;
      Consumed
    } else if c == 'p' || c == 'P' {
      if !any {
        self.report(sink, "expected hex digits", Span { start: pos, end: pos + 1 });
        return Consumed;
      }
      self.buf.push(c);
      self.num_is_float = true;
      self.state = State::NumHexExpSign;
      Consumed
    } else if !any {
      self.report(sink, "expected hex digits", Span { start: pos, end: pos + 1 });
      Consumed
    } else {
      self.finish_number(sink, pos);
      Reprocess
    }
  }

  fn dispatch_num_hex_frac(&mut self, sink: &mut impl Sink, c: char, pos: usize) -> Dispatch {
    use Dispatch::*;
    if c.is_ascii_hexdigit() {
      self.buf.push(c);
      Consumed
    } else if c == 'p' || c == 'P' {
      self.buf.push(c);
      self.state = State::NumHexExpSign;
      Consumed
    } else {
      self.finish_number(sink, pos);
      Reprocess
    }
  }

  fn dispatch_num_hex_exp_sign(&mut self, sink: &mut impl Sink, c: char, pos: usize) -> Dispatch {
    use Dispatch::*;
    if c == '+' || c == '-' {
      self.buf.push(c);
      self.state = State::NumHexExp { digits: 0 };
      Consumed
    } else if c.is_ascii_digit() {
      self.buf.push(c);
      self.state = State::NumHexExp { digits: 1 };
      Consumed
    } else {
      self.report(sink, "malformed exponent", Span { start: pos, end: pos + 1 });
      Consumed
    }
  }

  fn dispatch_num_hex_exp(&mut self, sink: &mut impl Sink, c: char, pos: usize, digits: u8) -> Dispatch {
    use Dispatch::*;
    if c.is_ascii_digit() {
      if digits >= 2 {
        self.report(sink, "exponent too long (max 2 hex digits)", Span { start: pos, end: pos + 1 });
        return Consumed;
      }
      self.buf.push(c);
      self.state = State::NumHexExp { digits: digits + 1 };
      Consumed
    } else if digits == 0 {
      self.report(sink, "malformed exponent", Span { start: pos, end: pos + 1 });
      Consumed
    } else {
      self.finish_number(sink, pos);
      Reprocess
    }
  }

  fn dispatch_num_octal(&mut self, sink: &mut impl Sink, c: char, pos: usize) -> Dispatch {
    use Dispatch::*;
    if ('0'..='7').contains(&c) {
      self.buf.push(c);
      Consumed
    } else if c == '8' || c == '9' {
      self.report(sink, "invalid digit in octal literal", Span { start: pos, end: pos + 1 });
      Consumed
    } else {
      self.finish_number(sink, pos);
      Reprocess
    }
  }

  fn dispatch_num_bin(&mut self, sink: &mut impl Sink, c: char, pos: usize) -> Dispatch {
    use Dispatch::*;
    if c == '0' || c == '1' {
      self.buf.push(c);
      Consumed
    } else {
      self.finish_number(sink, pos);
      Reprocess
    }
  }

  fn finish_number(&mut self, sink: &mut impl Sink, end_pos: usize) {
    let span = Span { start: self.token_start, end: end_pos };
    let text = std::mem::take(&mut self.buf);
    let token = parse_number(self.num_base, self.num_is_float, &text);
    self.num_is_float = false;
    if self.emit(sink, token, span) {
      self.state = State::Expr;
    }
  }
}

enum Dispatch {
  Consumed,
  Reprocess,
}

fn is_ident_start(c: char) -> bool {
  c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
  c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

fn is_symbol_char(c: char) -> bool {
  matches!(
    c,
    '`' | '~' | '!' | '@' | '#' | '%' | '^' | '&' | '*' | '(' | ')' | '-' | '+' | '=' | '[' | ']' | '|' | '\\' | ':' | ',' | '<' | '.' | '>' | '?' | '/'
  )
}

fn match_two_char(s: &str) -> Option<(usize, Keyword)> {
  let mut chars = s.chars();
  let a = chars.next()?;
  let b = chars.next()?;
  let kw = match (a, b) {
    ('<', '=') => Keyword::Le,
    ('>', '=') => Keyword::Ge,
    ('*', '*') => Keyword::Pow,
    _ => return None,
  };
  Some((a.len_utf8() + b.len_utf8(), kw))
}

fn match_one_char(s: &str) -> Option<(usize, Keyword)> {
  let c = s.chars().next()?;
  let kw = match c {
    '=' => Keyword::Eq,
    '~' => Keyword::Concat,
    '+' => Keyword::Plus,
    '-' => Keyword::Minus,
    '*' => Keyword::Star,
    '/' => Keyword::Slash,
    '%' => Keyword::Percent,
    '<' => Keyword::Lt,
    '>' => Keyword::Gt,
    '!' => Keyword::Bang,
    '.' => Keyword::Dot,
    ',' => Keyword::Comma,
    '(' => Keyword::LParen,
    ')' => Keyword::RParen,
    '[' => Keyword::LBracket,
    ']' => Keyword::RBracket,
    _ => return None,
  };
  Some((c.len_utf8(), kw))
}

fn strip_prefix(base: Base, text: &str) -> &str {
  match base {
    Base::Hex | Base::Bin => &text[2..],
    Base::Oct | Base::Dec => text,
  }
}

fn parse_number(base: Base, is_float: bool, text: &str) -> Token {
  if is_float {
    return match base {
      Base::Dec => Token::Float(text.parse().unwrap_or(f64::NAN)),
      Base::Hex => Token::Float(parse_hex_float(strip_prefix(base, text))),
      Base::Bin | Base::Oct => Token::Float(text.parse().unwrap_or(f64::NAN)),
    };
  }
  let digits = strip_prefix(base, text);
  match i64::from_str_radix(digits, base.radix()) {
    Ok(v) => Token::Int(v),
    Err(_) => Token::Float(fold_radix_as_f64(digits, base.radix())),
  }
}

fn fold_radix_as_f64(digits: &str, radix: u32) -> f64 {
  let mut acc = 0f64;
  for c in digits.chars() {
    if let Some(d) = c.to_digit(radix) {
      acc = acc * radix as f64 + d as f64;
    }
  }
  acc
}

/// Parses the C-style hex-float body (no `0x` prefix), e.g. `1.8p10`.
fn parse_hex_float(body: &str) -> f64 {
  let (mantissa, exponent) = match body.find(['p', 'P']) {
    Some(idx) => (&body[..idx], body[idx + 1..].parse::<i32>().unwrap_or(0)),
    None => (body, 0),
  };
  let (int_part, frac_part) = match mantissa.find('.') {
    Some(idx) => (&mantissa[..idx], &mantissa[idx + 1..]),
    None => (mantissa, ""),
  };
  let int_val = fold_radix_as_f64(int_part, 16);
  let frac_val = if frac_part.is_empty() {
    0.0
  } else {
    fold_radix_as_f64(frac_part, 16) / 16f64.powi(frac_part.len() as i32)
  };
  (int_val + frac_val) * 2f64.powi(exponent)
}

#[cfg(test)]
mod tests;
