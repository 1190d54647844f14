//! Evaluator for ncurses-style parametrized capability strings.
//!
//! Capabilities like `cup` embed a small stack program in `%`-directives:
//! parameter pushes, integer literals, arithmetic, comparisons, variables,
//! and `%? %t %e %;` conditionals. Evaluation is pure: the capability
//! string is never mutated and every call starts from a clean machine, so a
//! deterministic output follows from `(capability, params)` alone.
//!
//! Arithmetic is two's-complement signed 64-bit; division or modulo by zero
//! yields 0 and evaluation continues. Directives the machine does not know
//! are copied to the output verbatim (including the `%`), which keeps
//! malformed capabilities visible rather than silently dropped.

const MAX_PARAMS: usize = 9;

/// Evaluate `cap` against up to nine integer parameters.
pub fn tparm(cap: &str, params: &[i64]) -> String {
    let mut machine = Machine::new(params);
    machine.run(cap.as_bytes());
    machine.output
}

struct Machine {
    params: [i64; MAX_PARAMS],
    stack: Vec<i64>,
    statics: [i64; 26],
    dynamics: [i64; 26],
    output: String,
}

impl Machine {
    fn new(params: &[i64]) -> Machine {
        let mut fixed = [0i64; MAX_PARAMS];
        for (slot, value) in fixed.iter_mut().zip(params.iter()) {
            *slot = *value;
        }
        Machine {
            params: fixed,
            stack: Vec::with_capacity(4),
            statics: [0; 26],
            dynamics: [0; 26],
            output: String::new(),
        }
    }

    fn push(&mut self, value: i64) {
        self.stack.push(value);
    }

    fn pop(&mut self) -> i64 {
        self.stack.pop().unwrap_or(0)
    }

    fn run(&mut self, bytes: &[u8]) {
        let mut i = 0usize;
        while i < bytes.len() {
            let b = bytes[i];
            if b != b'%' {
                // Capability strings are ASCII escape text; pass through.
                self.output.push(b as char);
                i += 1;
                continue;
            }
            i += 1;
            if i >= bytes.len() {
                self.output.push('%');
                break;
            }
            i = self.directive(bytes, i);
        }
    }

    /// Execute one directive starting at `i` (just past the `%`); returns
    /// the index of the next unread byte.
    fn directive(&mut self, bytes: &[u8], i: usize) -> usize {
        match bytes[i] {
            b'%' => {
                self.output.push('%');
                i + 1
            }
            b'p' => {
                if let Some(&digit) = bytes.get(i + 1) {
                    if (b'1'..=b'9').contains(&digit) {
                        let index = (digit - b'1') as usize;
                        self.push(self.params[index]);
                        return i + 2;
                    }
                }
                self.unknown(bytes, i)
            }
            b'{' => {
                let mut j = i + 1;
                let mut value: i64 = 0;
                let mut negative = false;
                if bytes.get(j) == Some(&b'-') {
                    negative = true;
                    j += 1;
                }
                while j < bytes.len() && bytes[j].is_ascii_digit() {
                    value = value.wrapping_mul(10).wrapping_add((bytes[j] - b'0') as i64);
                    j += 1;
                }
                if bytes.get(j) == Some(&b'}') {
                    self.push(if negative { -value } else { value });
                    j + 1
                } else {
                    self.unknown(bytes, i)
                }
            }
            b'\'' => {
                // %'c' pushes a character constant.
                if let (Some(&ch), Some(&b'\'')) = (bytes.get(i + 1), bytes.get(i + 2)) {
                    self.push(ch as i64);
                    i + 3
                } else {
                    self.unknown(bytes, i)
                }
            }
            b'd' => {
                let value = self.pop();
                self.output.push_str(&value.to_string());
                i + 1
            }
            b'c' => {
                let value = self.pop();
                self.output.push((value as u8) as char);
                i + 1
            }
            b'i' => {
                self.params[0] = self.params[0].wrapping_add(1);
                self.params[1] = self.params[1].wrapping_add(1);
                i + 1
            }
            b'g' => {
                if let Some(&name) = bytes.get(i + 1) {
                    if name.is_ascii_uppercase() {
                        self.push(self.statics[(name - b'A') as usize]);
                        return i + 2;
                    }
                    if name.is_ascii_lowercase() {
                        self.push(self.dynamics[(name - b'a') as usize]);
                        return i + 2;
                    }
                }
                self.unknown(bytes, i)
            }
            b'P' => {
                if let Some(&name) = bytes.get(i + 1) {
                    let value = self.pop();
                    if name.is_ascii_uppercase() {
                        self.statics[(name - b'A') as usize] = value;
                        return i + 2;
                    }
                    if name.is_ascii_lowercase() {
                        self.dynamics[(name - b'a') as usize] = value;
                        return i + 2;
                    }
                }
                self.unknown(bytes, i)
            }
            b'+' | b'-' | b'*' | b'/' | b'm' => {
                let b2 = self.pop();
                let a = self.pop();
                let result = match bytes[i] {
                    b'+' => a.wrapping_add(b2),
                    b'-' => a.wrapping_sub(b2),
                    b'*' => a.wrapping_mul(b2),
                    b'/' => {
                        if b2 == 0 {
                            0
                        } else {
                            a.wrapping_div(b2)
                        }
                    }
                    _ => {
                        if b2 == 0 {
                            0
                        } else {
                            a.wrapping_rem(b2)
                        }
                    }
                };
                self.push(result);
                i + 1
            }
            b'&' | b'|' | b'^' => {
                let b2 = self.pop();
                let a = self.pop();
                let result = match bytes[i] {
                    b'&' => a & b2,
                    b'|' => a | b2,
                    _ => a ^ b2,
                };
                self.push(result);
                i + 1
            }
            b'~' => {
                let a = self.pop();
                self.push(!a);
                i + 1
            }
            b'!' => {
                let a = self.pop();
                self.push((a == 0) as i64);
                i + 1
            }
            b'=' | b'<' | b'>' => {
                let b2 = self.pop();
                let a = self.pop();
                let result = match bytes[i] {
                    b'=' => a == b2,
                    b'<' => a < b2,
                    _ => a > b2,
                };
                self.push(result as i64);
                i + 1
            }
            b'A' | b'O' => {
                let b2 = self.pop();
                let a = self.pop();
                let result = if bytes[i] == b'A' {
                    a != 0 && b2 != 0
                } else {
                    a != 0 || b2 != 0
                };
                self.push(result as i64);
                i + 1
            }
            b'?' => i + 1, // condition start: evaluation continues inline
            b't' => {
                if self.pop() != 0 {
                    i + 1
                } else {
                    // False: skip to the matching %e or %; at this depth.
                    skip_false_branch(bytes, i + 1)
                }
            }
            b'e' => {
                // A %e reached inline means the %t branch ran; skip the else
                // part to the matching %;.
                skip_else_branch(bytes, i + 1)
            }
            b';' => i + 1,
            b':' | b'0'..=b'9' | b'.' | b'#' | b' ' | b's' | b'o' | b'x' | b'X' => {
                self.formatted(bytes, i)
            }
            other => {
                self.output.push('%');
                self.output.push(other as char);
                i + 1
            }
        }
    }

    /// `%[:]flags[width][.precision](d|s|o|x|X)` formatted output. The colon
    /// form allows a leading `-` flag without reading it as subtraction.
    fn formatted(&mut self, bytes: &[u8], i: usize) -> usize {
        let start = i;
        let mut j = i;
        if bytes[j] == b':' {
            j += 1;
        }
        let mut left_align = false;
        let mut zero_pad = false;
        while let Some(&flag) = bytes.get(j) {
            match flag {
                b'-' => left_align = true,
                b'0' if !bytes
                    .get(j + 1)
                    .map(|b| b.is_ascii_digit() || *b == b'.')
                    .unwrap_or(false) =>
                {
                    break
                }
                b'0' => zero_pad = true,
                b'+' | b'#' | b' ' => {}
                _ => break,
            }
            j += 1;
        }
        let mut width = 0usize;
        while let Some(&digit) = bytes.get(j) {
            if !digit.is_ascii_digit() {
                break;
            }
            width = width * 10 + (digit - b'0') as usize;
            j += 1;
        }
        let mut precision = None;
        if bytes.get(j) == Some(&b'.') {
            j += 1;
            let mut p = 0usize;
            while let Some(&digit) = bytes.get(j) {
                if !digit.is_ascii_digit() {
                    break;
                }
                p = p * 10 + (digit - b'0') as usize;
                j += 1;
            }
            precision = Some(p);
        }
        let conversion = match bytes.get(j) {
            Some(&c) if matches!(c, b'd' | b's' | b'o' | b'x' | b'X') => c,
            _ => return self.unknown(bytes, start),
        };

        let value = self.pop();
        let mut body = match conversion {
            b'o' => format!("{:o}", value),
            b'x' => format!("{:x}", value),
            b'X' => format!("{:X}", value),
            _ => value.to_string(),
        };
        if let Some(p) = precision {
            // Minimum digit count, zero-filled, sign preserved.
            let negative = body.starts_with('-');
            let digits = if negative { &body[1..] } else { &body[..] };
            if digits.len() < p {
                let mut padded = String::new();
                if negative {
                    padded.push('-');
                }
                padded.extend(std::iter::repeat_n('0', p - digits.len()));
                padded.push_str(digits);
                body = padded;
            }
        }
        while body.len() < width {
            if left_align {
                body.push(' ');
            } else if zero_pad {
                body.insert(0, '0');
            } else {
                body.insert(0, ' ');
            }
        }
        self.output.push_str(&body);
        j + 1
    }

    /// Emit an unrecognized directive literally: `%` plus its first byte.
    fn unknown(&mut self, bytes: &[u8], i: usize) -> usize {
        self.output.push('%');
        self.output.push(bytes[i] as char);
        i + 1
    }
}

/// Skip a false `%t` branch: everything up to the matching `%e` (whose else
/// part then executes) or `%;`, honoring nested conditionals.
fn skip_false_branch(bytes: &[u8], mut i: usize) -> usize {
    let mut depth = 0usize;
    while i + 1 < bytes.len() {
        if bytes[i] == b'%' {
            match bytes[i + 1] {
                b'?' => depth += 1,
                b';' => {
                    if depth == 0 {
                        return i + 2;
                    }
                    depth -= 1;
                }
                b'e' if depth == 0 => return i + 2,
                _ => {}
            }
            i += 2;
        } else {
            i += 1;
        }
    }
    bytes.len()
}

/// Skip an untaken `%e` branch to the matching `%;`.
fn skip_else_branch(bytes: &[u8], mut i: usize) -> usize {
    let mut depth = 0usize;
    while i + 1 < bytes.len() {
        if bytes[i] == b'%' {
            match bytes[i + 1] {
                b'?' => depth += 1,
                b';' => {
                    if depth == 0 {
                        return i + 2;
                    }
                    depth -= 1;
                }
                _ => {}
            }
            i += 2;
        } else {
            i += 1;
        }
    }
    bytes.len()
}
