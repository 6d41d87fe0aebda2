// Small dense linear algebra helpers for the engines.
//
// Vectors are plain Vec<f64>. The eigen solver is matrix-free: callers hand
// it a closure applying a symmetric positive semi-definite operator, so the
// latent semantic engine can work straight off its sparse rows and the
// separation engine off an embedding-sized covariance matrix.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Eigenvalues at or below this fraction of the largest are treated as zero.
const RANK_TOLERANCE: f64 = 1e-10;

/// Extra vectors carried in the iteration block beyond the `k` requested.
const OVERSAMPLE: usize = 10;

/// Sweep cap for the Jacobi solver on the projected block.
const JACOBI_SWEEPS: usize = 100;

/// One eigenvalue with its unit-norm eigenvector.
#[derive(Debug, Clone)]
pub struct EigenPair {
    pub value: f64,
    pub vector: Vec<f64>,
}

/// Seeded RNG when a seed is configured, OS entropy otherwise.
pub fn solver_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

pub fn norm(v: &[f64]) -> f64 {
    dot(v, v).sqrt()
}

/// Scale `v` to unit length in place and return its previous norm.
/// Vectors with (near) zero norm are left untouched.
pub fn normalize(v: &mut [f64]) -> f64 {
    let n = norm(v);
    if n > f64::EPSILON {
        for x in v.iter_mut() {
            *x /= n;
        }
    }
    n
}

/// Signed cosine similarity; 0.0 when either vector is (near) zero.
pub fn cosine(a: &[f64], b: &[f64]) -> f64 {
    let denom = norm(a) * norm(b);
    if denom < f64::EPSILON {
        0.0
    } else {
        dot(a, b) / denom
    }
}

pub fn mat_vec(matrix: &[Vec<f64>], v: &[f64]) -> Vec<f64> {
    matrix.iter().map(|row| dot(row, v)).collect()
}

/// Remove the components of `v` along each (unit-norm) basis vector.
pub fn orthogonalize(v: &mut [f64], basis: &[Vec<f64>]) {
    for b in basis {
        let proj = dot(v, b);
        for (x, y) in v.iter_mut().zip(b) {
            *x -= proj * y;
        }
    }
}

/// `Σ_j coefficients[j] * basis[j]`.
fn combine(basis: &[Vec<f64>], coefficients: &[f64]) -> Vec<f64> {
    let dim = basis.first().map_or(0, Vec::len);
    let mut out = vec![0.0; dim];
    for (b, &c) in basis.iter().zip(coefficients) {
        for (acc, x) in out.iter_mut().zip(b) {
            *acc += c * x;
        }
    }
    out
}

fn random_vector(dim: usize, rng: &mut impl Rng) -> Vec<f64> {
    (0..dim).map(|_| rng.random_range(-1.0..1.0)).collect()
}

/// Modified Gram-Schmidt (two passes) over a block of vectors. A vector that
/// vanishes against the ones before it is replaced by a fresh random one.
fn orthonormalize(block: &mut [Vec<f64>], rng: &mut impl Rng) {
    for i in 0..block.len() {
        let (done, rest) = block.split_at_mut(i);
        let column = &mut rest[0];
        let before = norm(column);
        orthogonalize(column, done);
        orthogonalize(column, done);
        if before <= f64::MIN_POSITIVE || norm(column) <= before * 1e-8 {
            *column = random_vector(column.len(), rng);
            orthogonalize(column, done);
            orthogonalize(column, done);
        }
        normalize(column);
    }
}

/// Flip the sign of a row so its largest-magnitude entry is positive.
pub fn align_sign(row: &mut [f64]) {
    let pivot = row
        .iter()
        .enumerate()
        .fold(None::<(usize, f64)>, |best, (i, &w)| match best {
            Some((_, b)) if b >= w.abs() => best,
            _ => Some((i, w.abs())),
        });
    if let Some((i, _)) = pivot {
        if row[i] < 0.0 {
            for w in row.iter_mut() {
                *w = -*w;
            }
        }
    }
}

/// All eigenpairs of a small symmetric matrix, largest value first.
///
/// Cyclic Jacobi rotations; meant for the projected block matrices of
/// `top_eigenpairs`, which are a few dozen rows at most.
pub fn jacobi_eigen(matrix: &[Vec<f64>]) -> Vec<EigenPair> {
    let n = matrix.len();
    let mut a = matrix.to_vec();
    let mut v: Vec<Vec<f64>> = (0..n)
        .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
        .collect();

    let scale: f64 = a.iter().flatten().map(|x| x * x).sum::<f64>().sqrt();
    for _ in 0..JACOBI_SWEEPS {
        let off: f64 = (0..n)
            .flat_map(|p| (p + 1..n).map(move |q| (p, q)))
            .map(|(p, q)| a[p][q] * a[p][q])
            .sum::<f64>()
            .sqrt();
        if off <= f64::EPSILON * scale || off == 0.0 {
            break;
        }
        for p in 0..n {
            for q in p + 1..n {
                if a[p][q] == 0.0 {
                    continue;
                }
                let theta = (a[q][q] - a[p][p]) / (2.0 * a[p][q]);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;
                for k in 0..n {
                    let (kp, kq) = (a[k][p], a[k][q]);
                    a[k][p] = c * kp - s * kq;
                    a[k][q] = s * kp + c * kq;
                }
                for k in 0..n {
                    let (pk, qk) = (a[p][k], a[q][k]);
                    a[p][k] = c * pk - s * qk;
                    a[q][k] = s * pk + c * qk;
                }
                for row in v.iter_mut() {
                    let (kp, kq) = (row[p], row[q]);
                    row[p] = c * kp - s * kq;
                    row[q] = s * kp + c * kq;
                }
            }
        }
    }

    let mut pairs: Vec<EigenPair> = (0..n)
        .map(|j| EigenPair {
            value: a[j][j],
            vector: v.iter().map(|row| row[j]).collect(),
        })
        .collect();
    pairs.sort_by(|x, y| y.value.partial_cmp(&x.value).unwrap_or(std::cmp::Ordering::Equal));
    pairs
}

/// Top `k` eigenpairs of a symmetric positive semi-definite operator on
/// `dim`-dimensional vectors.
///
/// Block subspace iteration with a Rayleigh-Ritz step each round: the block
/// (k plus a few extra vectors) is pushed through `apply`, projected, and
/// rotated onto the Ritz vectors of the projection. Iteration stops once
/// every wanted pair has a residual `‖Mx − θx‖` below `tol` times the
/// largest eigenvalue, or after `max_iter` rounds. Pairs come back largest
/// first; when `k` exceeds the operator's rank the trailing values are ~0.
pub fn top_eigenpairs<F>(
    dim: usize,
    k: usize,
    apply: F,
    max_iter: usize,
    tol: f64,
    rng: &mut impl Rng,
) -> Vec<EigenPair>
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    let k = k.min(dim);
    if k == 0 {
        return Vec::new();
    }
    let width = (k + OVERSAMPLE).min(dim);

    let mut block: Vec<Vec<f64>> = (0..width).map(|_| random_vector(dim, rng)).collect();
    orthonormalize(&mut block, rng);

    let mut ritz: Vec<EigenPair> = Vec::new();
    for _ in 0..max_iter.max(1) {
        let images: Vec<Vec<f64>> = block.iter().map(|x| apply(x.as_slice())).collect();

        let projected: Vec<Vec<f64>> = (0..width)
            .map(|i| {
                (0..width)
                    .map(|j| 0.5 * (dot(&block[i], &images[j]) + dot(&block[j], &images[i])))
                    .collect()
            })
            .collect();
        let small = jacobi_eigen(&projected);

        let vectors: Vec<Vec<f64>> = small.iter().map(|p| combine(&block, &p.vector)).collect();
        let rotated: Vec<Vec<f64>> = small.iter().map(|p| combine(&images, &p.vector)).collect();

        let largest = small.first().map_or(0.0, |p| p.value.abs());
        let converged = small.iter().take(k).zip(&vectors).zip(&rotated).all(
            |((pair, x), mx)| {
                let residual: f64 = mx
                    .iter()
                    .zip(x)
                    .map(|(a, b)| (a - pair.value * b).powi(2))
                    .sum::<f64>()
                    .sqrt();
                residual <= tol * largest
            },
        );

        ritz = small
            .iter()
            .zip(vectors)
            .take(k)
            .map(|(pair, vector)| EigenPair {
                value: pair.value.max(0.0),
                vector,
            })
            .collect();
        if converged {
            break;
        }

        block = rotated;
        orthonormalize(&mut block, rng);
    }

    ritz
}

/// Number of leading pairs whose eigenvalue is meaningfully above zero.
pub fn effective_rank(pairs: &[EigenPair]) -> usize {
    let largest = pairs.iter().map(|p| p.value).fold(0.0_f64, f64::max);
    let cutoff = (largest * RANK_TOLERANCE).max(1e-12);
    pairs.iter().take_while(|p| p.value > cutoff).count()
}
