// src/dev/generator.rs
// Random programs that lex, parse, check and lower cleanly. Everything is
// `int` (directly or through an alias) so any arithmetic mix type-checks.

use rand::Rng;

#[derive(Default)]
struct Names {
    aliases: usize,
    globals: usize,
    /// arity of each function emitted so far
    funcs: Vec<usize>,
}

/// Produces a program of at least `target_len` bytes (0 gives an empty file).
/// `prefix` keeps names unique when several generated files share a batch.
pub fn gen_program<R: Rng>(rng: &mut R, target_len: usize, prefix: &str) -> String {
    let mut out = String::with_capacity(target_len + target_len / 4);
    let mut names = Names::default();

    while out.len() < target_len {
        match rng.random_range(0u32..100) {
            0..=9 => push_alias(rng, &mut out, &mut names, prefix),
            10..=34 => push_global(rng, &mut out, &mut names, prefix),
            35..=44 => push_line_comment(rng, &mut out),
            45..=99 => push_function(rng, &mut out, &mut names, prefix),
            _ => unreachable!(),
        }
    }
    out
}

pub fn gen_valid_source<R: Rng>(rng: &mut R, target_len: usize) -> String {
    gen_program(rng, target_len, "")
}

fn push_alias<R: Rng>(rng: &mut R, out: &mut String, names: &mut Names, prefix: &str) {
    let target = if names.aliases > 0 && rng.random_bool(0.3) {
        format!("{prefix}t{}", rng.random_range(0..names.aliases))
    } else {
        "int".to_string()
    };
    out.push_str(&format!("type {prefix}t{} = {target};\n", names.aliases));
    names.aliases += 1;
}

fn int_type<R: Rng>(rng: &mut R, names: &Names, prefix: &str) -> String {
    if names.aliases > 0 && rng.random_bool(0.4) {
        format!("{prefix}t{}", rng.random_range(0..names.aliases))
    } else {
        "int".to_string()
    }
}

fn push_global<R: Rng>(rng: &mut R, out: &mut String, names: &mut Names, prefix: &str) {
    let ty = int_type(rng, names, prefix);
    out.push_str(&format!("var {prefix}g{}: {ty}", names.globals));
    if rng.random_bool(0.7) {
        out.push_str(" = ");
        push_int(rng, out);
    }
    out.push_str(";\n");
    names.globals += 1;
}

fn push_function<R: Rng>(rng: &mut R, out: &mut String, names: &mut Names, prefix: &str) {
    let arity = rng.random_range(0..=3);
    let params: Vec<String> = (0..arity).map(|i| format!("p{i}")).collect();
    let list: Vec<String> = params
        .iter()
        .map(|p| format!("{p}: {}", int_type(rng, names, prefix)))
        .collect();
    let id = names.funcs.len();
    out.push_str(&format!(
        "func {prefix}f{id}({}): {} {{\n",
        list.join(", "),
        int_type(rng, names, prefix)
    ));

    // values visible in the body: params, globals, then locals as declared
    let mut scope = params;
    scope.extend((0..names.globals).map(|i| format!("{prefix}g{i}")));
    let mut locals = 0usize;
    for _ in 0..rng.random_range(0..=6) {
        match rng.random_range(0u32..100) {
            0..=39 => {
                let name = format!("v{locals}");
                out.push_str(&format!("    var {name}: {}", int_type(rng, names, prefix)));
                if rng.random_bool(0.8) {
                    out.push_str(" = ");
                    push_expr(rng, out, &scope, names, prefix);
                }
                out.push_str(";\n");
                scope.push(name);
                locals += 1;
            }
            40..=69 if !scope.is_empty() => {
                let target = &scope[rng.random_range(0..scope.len())];
                out.push_str(&format!("    {target} = "));
                push_expr(rng, out, &scope, names, prefix);
                out.push_str(";\n");
            }
            70..=89 if !names.funcs.is_empty() => {
                out.push_str("    ");
                push_call(rng, out, &scope, names, prefix);
                out.push_str(";\n");
            }
            _ => out.push_str("    // nothing here\n"),
        }
    }
    out.push_str("    return ");
    push_expr(rng, out, &scope, names, prefix);
    out.push_str(";\n}\n");
    names.funcs.push(arity);
}

fn push_expr<R: Rng>(
    rng: &mut R,
    out: &mut String,
    scope: &[String],
    names: &Names,
    prefix: &str,
) {
    const OPS: [&str; 5] = ["+", "-", "*", "/", "%"];
    push_operand(rng, out, scope, names, prefix);
    for _ in 0..rng.random_range(0..=3) {
        out.push_str(&format!(" {} ", OPS[rng.random_range(0..OPS.len())]));
        push_operand(rng, out, scope, names, prefix);
    }
}

fn push_operand<R: Rng>(
    rng: &mut R,
    out: &mut String,
    scope: &[String],
    names: &Names,
    prefix: &str,
) {
    match rng.random_range(0u32..100) {
        0..=14 if !names.funcs.is_empty() => push_call(rng, out, scope, names, prefix),
        15..=59 if !scope.is_empty() => out.push_str(&scope[rng.random_range(0..scope.len())]),
        _ => push_int(rng, out),
    }
}

fn push_call<R: Rng>(
    rng: &mut R,
    out: &mut String,
    scope: &[String],
    names: &Names,
    prefix: &str,
) {
    let callee = rng.random_range(0..names.funcs.len());
    let args: Vec<String> = (0..names.funcs[callee])
        .map(|_| {
            if !scope.is_empty() && rng.random_bool(0.5) {
                scope[rng.random_range(0..scope.len())].clone()
            } else {
                rng.random_range(0u32..1000).to_string()
            }
        })
        .collect();
    out.push_str(&format!("{prefix}f{callee}({})", args.join(", ")));
}

fn push_int<R: Rng>(rng: &mut R, out: &mut String) {
    let v: u32 = rng.random_range(0..100_000);
    match rng.random_range(0u32..10) {
        0 => out.push_str(&format!("{v:#x}")),
        1 => out.push_str(&format!("{:#b}", v & 0xff)),
        2 => out.push_str(&format!("{v}u")),
        _ => out.push_str(&v.to_string()),
    }
}

fn push_line_comment<R: Rng>(rng: &mut R, out: &mut String) {
    out.push_str("//");
    let len = rng.random_range(0..=40);
    const ALPH: &[u8] =
        b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789 +-*/_@#{}()<>=";
    for _ in 0..len {
        out.push(ALPH[rng.random_range(0..ALPH.len())] as char);
    }
    out.push('\n');
}
