use faer::Mat;
use geodesic_rbf::{
    KansaSolver, RBFTestFunctions, TriangleMesh, interpolant_config::KansaSettings,
};
use geodesic_rbf_utils::KernelType;
use std::sync::Arc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let nx = 12;
    let ny = 12;
    let mesh = Arc::new(TriangleMesh::grid(nx, ny, 11.0, 11.0));
    let n = mesh.num_vertices();

    // Kansa expects the operator constrained vertices first. On this grid the
    // first row of vertices (y = 0) plays that role.
    let n_i = nx;

    // Uniform graph Laplacian rows for the operator constrained vertices
    let mut laplacian = Mat::<f64>::zeros(n_i, n);
    for (a, b) in mesh.edges() {
        for (row, other) in [(a, b), (b, a)] {
            if row < n_i {
                laplacian[(row, row)] -= 1.0;
                laplacian[(row, other)] += 1.0;
            }
        }
    }

    // Zero Laplacian on the first row, bump values everywhere else
    let mut rhs = RBFTestFunctions::smooth_bump(&mesh);
    rhs[..n_i].fill(0.0);

    let settings = KansaSettings::builder(KernelType::Multiquadric)
        .epsilon(0.8)
        .build();

    let solver = KansaSolver::builder(mesh.clone(), laplacian, rhs.clone(), n_i, settings).build()?;
    if solver.is_singular() {
        println!("collocation matrix is singular");
        return Ok(());
    }

    let fitted = solver.evaluate_at_vertices()?;
    let max_error = (n_i..n)
        .map(|i| (fitted[(i, 0)] - rhs[i]).abs())
        .fold(0.0f64, f64::max);
    println!("max abs error at value constrained vertices: {max_error:.3e}");

    let path = std::env::temp_dir().join("kansa_grid.json");
    solver.save_model(&path)?;
    let loaded = KansaSolver::load_model(&path, None)?;
    println!(
        "reloaded model from {} with {} operator rows",
        path.display(),
        loaded.num_operator_rows()
    );

    Ok(())
}
