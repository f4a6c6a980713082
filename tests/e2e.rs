use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use rayon::prelude::*;
use simplepir_rs::{
    matrix::{Elem, Matrix, Naive},
    params::Params,
    pir::{derive_public_matrix, Client, Server},
    prg::BufferedPrg,
    Error,
};

const DB_BITS: [u64; 8] = [0, 1, 1, 0, 1, 0, 0, 1];

fn bit_db<T: Elem>() -> Matrix<T> {
    Matrix::from_data(1, 8, DB_BITS.iter().map(|b| T::from_u64(*b)).collect()).unwrap()
}

fn connect<T: Elem>(server: &Server<T>) -> Client<T> {
    Client::new(
        *server.params(),
        server.public_matrix().clone(),
        server.hint().clone(),
    )
    .unwrap()
}

fn run_bit_db<T: Elem>(params: Params, trials: usize) {
    let mut rng = ChaCha20Rng::seed_from_u64(0xdb);
    let mut prg = BufferedPrg::from_source(&mut rng).unwrap();

    let server = Server::<T>::setup(params, bit_db(), &mut prg).unwrap();
    let client = connect(&server);

    for _ in 0..trials {
        for (i, bit) in DB_BITS.iter().enumerate() {
            let (secret, query) = client.query_index(i, &mut prg).unwrap();
            let answer = server.answer(&query).unwrap();
            let got = client.recover(secret, &answer).unwrap();
            assert_eq!(got.dims(), (1, 1));
            assert_eq!(got.get(0, 0).unwrap().to_u64(), *bit, "index {}", i);
        }
    }
}

#[test]
fn recovers_every_bit() {
    let params = Params::new(1024, 8, 1, 2, 32, 1).unwrap();
    run_bit_db::<u32>(params, 50);
}

#[test]
fn recovers_every_bit_with_64_bit_elements() {
    let params = Params::new(1024, 8, 1, 2, 64, 1).unwrap();
    run_bit_db::<u64>(params, 20);
}

#[test]
fn recovers_every_bit_below_element_width() {
    run_bit_db::<u32>(Params::new(512, 8, 1, 2, 20, 1).unwrap(), 20);
    run_bit_db::<u64>(Params::new(512, 8, 1, 2, 32, 1).unwrap(), 20);
}

#[test]
fn recovers_every_bit_with_squishing() {
    let params = Params::new(1024, 8, 1, 2, 32, 3).unwrap();
    assert_eq!(params.padded_m(), 9);
    run_bit_db::<u32>(params, 20);
}

#[test]
fn recovers_larger_database() {
    let params = Params::pick(1024, 256, 32, 1, 1e-9).unwrap();
    let mut prg = BufferedPrg::new([21u8; 32]);
    let db = Matrix::<u32>::random_mod(&mut prg, 64, params.m, params.p).unwrap();

    let squished = Params::new(params.n, params.m, params.l, params.p, params.logmod, 2).unwrap();
    for params in [params, squished] {
        if params.check_width::<u32>().is_err() {
            continue;
        }
        let server = Server::<u32>::setup(params, db.clone(), &mut prg).unwrap();
        let client = connect(&server);
        for i in [0, 1, 100, 255] {
            let (secret, query) = client.query_index(i, &mut prg).unwrap();
            let got = client.recover(secret, &server.answer(&query).unwrap()).unwrap();
            assert_eq!(got, db.column(i).unwrap());
        }
    }
}

#[test]
fn client_rebuilds_public_matrix_from_seed() {
    let params = Params::new(256, 8, 1, 2, 32, 1).unwrap();
    let seed = [42u8; 32];
    let server = Server::<u32, Naive>::setup_from_seed(params, bit_db(), seed).unwrap();

    let a = derive_public_matrix(&params, seed).unwrap();
    let client = Client::new(params, a, server.hint().clone()).unwrap();

    let mut prg = BufferedPrg::new([43u8; 32]);
    let (secret, query) = client.query_index(6, &mut prg).unwrap();
    let got = client.recover(secret, &server.answer(&query).unwrap()).unwrap();
    assert_eq!(got.get(0, 0).unwrap(), 0);
}

#[test]
fn answers_concurrently() {
    let params = Params::new(512, 64, 4, 16, 32, 1).unwrap();
    let mut prg = BufferedPrg::new([31u8; 32]);
    let db = Matrix::<u32>::random_mod(&mut prg, 32, params.m, params.p).unwrap();
    let server = Server::<u32>::setup(params, db.clone(), &mut prg).unwrap();
    let client = connect(&server);

    let queries = (0..params.m)
        .map(|i| client.query_index(i, &mut prg).unwrap())
        .collect::<Vec<_>>();
    let answers = queries
        .par_iter()
        .map(|(_, q)| server.answer(q).unwrap())
        .collect::<Vec<_>>();

    for (i, ((secret, _), answer)) in queries.into_iter().zip(answers).enumerate() {
        assert_eq!(client.recover(secret, &answer).unwrap(), db.column(i).unwrap());
    }
}

#[test]
fn homomorphic_queries_compute_inner_products() {
    let params = Params::new(1024, 8, 1, 2, 32, 1).unwrap();
    let mut prg = BufferedPrg::new([51u8; 32]);
    let server = Server::<u32>::setup(params, bit_db(), &mut prg).unwrap();
    let client = connect(&server);

    // Parity of the selected bits.
    let x = Matrix::<u32>::column_vector(vec![1, 1, 1, 0, 0, 0, 0, 1]);
    let (secret, query) = client.query_lhe(&x, &mut prg).unwrap();
    let got = client.recover_lhe(&secret, &server.answer(&query).unwrap()).unwrap();
    assert_eq!(got.get(0, 0).unwrap(), 1);
}

#[test]
fn mismatched_query_is_rejected() {
    let params = Params::new(256, 8, 1, 2, 32, 3).unwrap();
    let mut prg = BufferedPrg::new([61u8; 32]);
    let server = Server::<u32>::setup(params, bit_db(), &mut prg).unwrap();
    let other = Server::<u32>::setup(
        Params::new(256, 8, 1, 2, 32, 1).unwrap(),
        bit_db(),
        &mut prg,
    )
    .unwrap();

    let (_, query) = connect(&other).query_index(0, &mut prg).unwrap();
    assert!(matches!(
        server.answer(&query),
        Err(Error::DimensionMismatch { .. })
    ));
}
