//! Float routines Cranelift calls when the CPU lacks an instruction for them
//! (`floor` without SSE4.1).

#[no_mangle]
pub extern "C" fn floor(x: f64) -> f64 {
    rt_core::floor(x)
}
