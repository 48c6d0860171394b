use geodesic_rbf::{
    GeodesicRBFInterpolator, RBFTestFunctions, SurfacePoint, TriangleMesh,
    farthest_vertex_sampling,
    interpolant_config::InterpolantSettings,
    progress::{ProgressMsg, closure_sink},
};
use geodesic_rbf_utils::KernelType;
use std::sync::Arc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A flat 21x21 grid spanning [0, 10]^2
    let mesh = Arc::new(TriangleMesh::grid(21, 21, 10.0, 10.0));

    // Values on every vertex from Franke's function
    let values = RBFTestFunctions::franke_on_vertices(&mesh);

    // Print progress as the system is assembled and solved
    let (sink, listener) = closure_sink(64, |msg| match msg {
        ProgressMsg::Message { message } => println!("{message}"),
        other => println!("{other:?}"),
    });

    // Choose 60 well-spread centres by geodesic farthest point sampling
    let sampler = geodesic_rbf::GeodesicMetric::new(mesh.clone());
    let centres = farthest_vertex_sampling(&sampler, 60, 0)?;

    let interpolant_settings = InterpolantSettings::builder(KernelType::Gaussian)
        .epsilon(1.5)
        .build();

    let rbfi = GeodesicRBFInterpolator::builder(mesh.clone(), values.clone(), centres, interpolant_settings)
        .progress_callback(sink)
        .build()?;

    if rbfi.is_singular() {
        println!("collocation matrix is singular; the interpolant is zero everywhere");
    }

    // Evaluate at every vertex and report the worst misfit
    let fitted = rbfi.evaluate_at_vertices()?;
    let max_error = (0..mesh.num_vertices())
        .map(|i| (fitted[(i, 0)] - values[i]).abs())
        .fold(0.0f64, f64::max);
    println!("max abs error over all vertices: {max_error:.3e}");

    // Evaluate part way across a face and show the path the distance followed
    let point = SurfacePoint::Position([3.3, 7.1, 0.0]);
    println!("s(3.3, 7.1) = {:.6}", rbfi.evaluate(point)?);
    let path = rbfi.geodesic_path(point, 0)?;
    println!("geodesic to vertex 0: length {:.4} through {} points", path.length, path.path.len());

    drop(rbfi);
    listener
        .join()
        .map_err(|_| "progress listener thread panicked")?;

    Ok(())
}
