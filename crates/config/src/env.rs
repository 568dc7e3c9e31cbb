/// Replace `${ENV_VAR}` placeholders in raw config text.
///
/// Placeholders that do not resolve (unknown variable, empty name, missing
/// closing brace) are left in the output untouched.
pub fn expand_env(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let Some(end) = after.find('}') else {
            // Unterminated placeholder: emit the remainder literally.
            out.push_str(&rest[start..]);
            rest = "";
            break;
        };

        let name = &after[..end];
        match std::env::var(name) {
            Ok(value) => out.push_str(&value),
            Err(_) => {
                out.push_str("${");
                out.push_str(name);
                out.push('}');
            },
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}
