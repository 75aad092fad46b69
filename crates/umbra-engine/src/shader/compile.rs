use crate::device::{GraphicsError, Result};

use super::layout::ShaderLayout;
use super::preprocess::preprocess;
use super::program::ShaderProgram;
use super::ShaderStage;

/// Entry point name of both stages.
pub const ENTRY_POINT: &str = "Main";

/// Preprocesses `source` for `stage` and validates the result.
///
/// Returns the stage-specific WGSL. Diagnostics are rendered against the
/// preprocessed text, whose line numbers match the original file.
pub fn compile_stage(label: &str, source: &str, stage: ShaderStage) -> Result<String> {
    let failed = |diagnostics: String| GraphicsError::ShaderCompile {
        label: label.to_string(),
        stage,
        diagnostics,
    };

    let stage_source = preprocess(source, &[stage.define()]).map_err(|e| failed(e.to_string()))?;

    let module = naga::front::wgsl::parse_str(&stage_source)
        .map_err(|e| failed(e.emit_to_string(&stage_source)))?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::empty(),
    );
    validator
        .validate(&module)
        .map_err(|e| failed(e.emit_to_string(&stage_source)))?;

    let has_entry = module
        .entry_points
        .iter()
        .any(|ep| ep.name == ENTRY_POINT && ep.stage == stage.naga());
    if !has_entry {
        return Err(failed(format!("missing {stage} entry point `{ENTRY_POINT}`")));
    }

    Ok(stage_source)
}

/// Compiles both stages of `source` into a program the backend can create.
pub fn compile(label: &str, source: &str, layout: ShaderLayout) -> Result<ShaderProgram> {
    let vertex_source = compile_stage(label, source, ShaderStage::Vertex)?;
    let pixel_source = compile_stage(label, source, ShaderStage::Pixel)?;
    log::debug!("compiled shader `{label}`");

    Ok(ShaderProgram { label: label.to_string(), vertex_source, pixel_source, layout })
}

#[cfg(test)]
mod tests {
    use super::*;

    const GEOMETRY: &str = include_str!("../../shaders/geometry.wgsl");
    const FRAME: &str = include_str!("../../shaders/frame.wgsl");

    const MINIMAL: &str = "\
#ifdef VERTEX_SHADER
@vertex
fn Main(@location(0) p: vec3<f32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(p, 1.0);
}
#endif
#ifdef PIXEL_SHADER
@fragment
fn Main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0);
}
#endif
";

    fn diagnostics(err: GraphicsError) -> (ShaderStage, String) {
        match err {
            GraphicsError::ShaderCompile { stage, diagnostics, .. } => (stage, diagnostics),
            other => panic!("unexpected error: {other}"),
        }
    }

    // ── bundled shaders ───────────────────────────────────────────────────

    #[test]
    fn geometry_shader_compiles_both_stages() {
        let program = compile("geometry", GEOMETRY, ShaderLayout::new()).unwrap();
        assert!(program.vertex_source.contains("@vertex"));
        assert!(!program.vertex_source.contains("@fragment"));
        assert!(program.pixel_source.contains("@fragment"));
    }

    #[test]
    fn frame_shader_compiles_both_stages() {
        let program = compile("frame", FRAME, ShaderLayout::new()).unwrap();
        assert!(!program.pixel_source.contains("@vertex"));
    }

    // ── failures ──────────────────────────────────────────────────────────

    #[test]
    fn minimal_source_compiles() {
        assert!(compile("minimal", MINIMAL, ShaderLayout::new()).is_ok());
    }

    #[test]
    fn syntax_error_carries_diagnostics() {
        let src = MINIMAL.replace("return vec4<f32>(p, 1.0);", "return vec4<f32>(p, 1.0)");
        let (stage, text) = diagnostics(compile("broken", &src, ShaderLayout::new()).unwrap_err());
        assert_eq!(stage, ShaderStage::Vertex);
        assert!(!text.is_empty());
    }

    #[test]
    fn type_error_in_pixel_stage_reports_pixel() {
        let src = MINIMAL.replace("return vec4<f32>(1.0);", "return 1u;");
        let (stage, _) = diagnostics(compile("broken", &src, ShaderLayout::new()).unwrap_err());
        assert_eq!(stage, ShaderStage::Pixel);
    }

    #[test]
    fn wrong_entry_point_name_rejected() {
        let src = MINIMAL.replace("fn Main(@location", "fn main(@location");
        let (stage, text) = diagnostics(compile("renamed", &src, ShaderLayout::new()).unwrap_err());
        assert_eq!(stage, ShaderStage::Vertex);
        assert!(text.contains(ENTRY_POINT));
    }

    #[test]
    fn unbalanced_directive_is_compile_error() {
        let src = format!("{MINIMAL}#ifdef EXTRA\n");
        assert!(matches!(
            compile("open", &src, ShaderLayout::new()),
            Err(GraphicsError::ShaderCompile { .. })
        ));
    }
}
