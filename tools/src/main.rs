use fskmodem_core::{Mode, DEFAULT_BLOCK_SIZE, DEFAULT_PREAMBLE, DEFAULT_TAIL};
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

fn render_modes() -> String {
    let mut content = String::from(
        r#"// AUTO-GENERATED FILE - DO NOT EDIT MANUALLY
// Generated from core/src/params.rs presets
// Run `cargo run -p generate-web-modes` to regenerate

export interface ModeConfig {
  baud: number;
  mark: number;
  space: number;
  rxDelay: number;
}

export const MODE_REGISTRY: Record<string, ModeConfig> = {
"#,
    );

    for mode in Mode::ALL {
        let plan = mode.params();
        let _ = writeln!(
            content,
            "  '{}': {{ baud: {}, mark: {}, space: {}, rxDelay: {:.12} }},",
            mode.name(),
            plan.baud,
            plan.mark,
            plan.space,
            plan.rx_delay
        );
    }

    let _ = write!(
        content,
        r#"}};

export const DEFAULT_PREAMBLE_SECONDS = {};
export const DEFAULT_TAIL_SECONDS = {};
export const WORKLET_BLOCK_SIZE = {};
"#,
        DEFAULT_PREAMBLE, DEFAULT_TAIL, DEFAULT_BLOCK_SIZE
    );
    content
}

fn main() -> std::io::Result<()> {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let root = manifest_dir.parent().unwrap_or(&manifest_dir);
    let output_path = root.join("web/src/constants/modes.ts");

    if let Some(dir) = output_path.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::write(&output_path, render_modes())?;

    println!("Generated: {}", output_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_lists_presets() {
        let content = render_modes();
        assert!(content.contains(
            "'bell103': { baud: 300, mark: 1270, space: 1070, rxDelay: 0.002351515183 },"
        ));
        assert!(content.contains(
            "'bell202': { baud: 1200, mark: 1200, space: 2200, rxDelay: 0.000445898150 },"
        ));
        assert!(content.contains("export const DEFAULT_PREAMBLE_SECONDS = 1;"));
        assert!(content.contains("export const WORKLET_BLOCK_SIZE = 128;"));
    }
}
