fn main() {
    println!("cargo:rerun-if-env-changed=GLYPHFALL_BUILD");
    println!("cargo:rerun-if-env-changed=GITHUB_SHA");
    println!("cargo:rerun-if-changed=.git/HEAD");

    let build_id = std::env::var("GLYPHFALL_BUILD")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(target_build_id);
    println!("cargo:rustc-env=GLYPHFALL_BUILD={}", build_id);

    let sha = git_short_sha()
        .or_else(|| short_hex(&std::env::var("GITHUB_SHA").unwrap_or_default()))
        .unwrap_or_default();
    println!("cargo:rustc-env=GLYPHFALL_GIT_SHA={}", sha);
}

fn short_hex(v: &str) -> Option<String> {
    let v = v.trim();
    if v.is_empty() {
        return None;
    }
    let short = &v[..v.len().min(7)];
    if short.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(short.to_ascii_lowercase())
    } else {
        None
    }
}

fn git_short_sha() -> Option<String> {
    let out = std::process::Command::new("git")
        .args(["rev-parse", "--short=7", "HEAD"])
        .output()
        .ok()?;
    if !out.status.success() {
        return None;
    }
    short_hex(&String::from_utf8(out.stdout).ok()?)
}

fn target_build_id() -> String {
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());
    let target = std::env::var("TARGET").unwrap_or_else(|_| "unknown".to_string());
    format!("{target} ({profile})")
}
