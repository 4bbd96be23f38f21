//! C back end.
//!
//! One C statement per [`Op`]. Cells are `unsigned char`, so arithmetic
//! wraps mod 256 on assignment. The tape is a zero-initialized static array
//! and the pointer starts at its first cell.

use std::fmt::Write;

use super::EmitOptions;
use crate::lower::Op;

const INDENT: &str = "    ";

pub fn emit(ops: &[Op], options: &EmitOptions) -> String {
    let mut out = String::new();
    out.push_str("#include <stdio.h>\n\n");
    let _ = writeln!(out, "static unsigned char tape[{}];\n", options.tape_size);
    out.push_str("static unsigned char read_byte(void) {\n");
    out.push_str("    int c = getchar();\n");
    out.push_str("    return c == EOF ? 0 : (unsigned char)c;\n");
    out.push_str("}\n\n");
    out.push_str("int main(void) {\n");
    out.push_str("    unsigned char *ptr = tape;\n");
    block(&mut out, ops, 1);
    out.push_str("    return 0;\n");
    out.push_str("}\n");
    out
}

fn block(out: &mut String, ops: &[Op], depth: usize) {
    for op in ops {
        let pad = INDENT.repeat(depth);
        // Writing to a String cannot fail.
        let _ = match op {
            Op::Add { offset, delta } => {
                let (sign, amount) = if *delta > 128 {
                    ('-', 256 - u32::from(*delta))
                } else {
                    ('+', u32::from(*delta))
                };
                writeln!(out, "{}{} {}= {};", pad, cell(*offset), sign, amount)
            }
            Op::Set { offset, value } => writeln!(out, "{}{} = {};", pad, cell(*offset), value),
            Op::MulAdd { offset, factor } => match factor {
                1 => writeln!(out, "{}{} += *ptr;", pad, cell(*offset)),
                255 => writeln!(out, "{}{} -= *ptr;", pad, cell(*offset)),
                f => writeln!(out, "{}{} += *ptr * {};", pad, cell(*offset), f),
            },
            Op::Output(1) => writeln!(out, "{}putchar(*ptr);", pad),
            Op::Output(n) => writeln!(out, "{}for (int i = 0; i < {}; i++) putchar(*ptr);", pad, n),
            Op::Input(n) => {
                for _ in 1..*n {
                    let _ = writeln!(out, "{}getchar();", pad);
                }
                writeln!(out, "{}*ptr = read_byte();", pad)
            }
            Op::Move(d) if *d < 0 => writeln!(out, "{}ptr -= {};", pad, d.unsigned_abs()),
            Op::Move(d) => writeln!(out, "{}ptr += {};", pad, d),
            Op::Scan(step) if *step < 0 => {
                writeln!(out, "{}while (*ptr) ptr -= {};", pad, step.unsigned_abs())
            }
            Op::Scan(step) => writeln!(out, "{}while (*ptr) ptr += {};", pad, step),
            Op::Loop(body) => {
                let _ = writeln!(out, "{}while (*ptr) {{", pad);
                block(out, body, depth + 1);
                writeln!(out, "{}}}", pad)
            }
            Op::Conditional(body) => {
                let _ = writeln!(out, "{}if (*ptr) {{", pad);
                block(out, body, depth + 1);
                writeln!(out, "{}}}", pad)
            }
        };
    }
}

fn cell(offset: i64) -> String {
    if offset == 0 {
        "*ptr".to_string()
    } else {
        format!("ptr[{}]", offset)
    }
}
