use std::fmt::{self, Debug, Formatter};

use crate::matrix::{Elem, Matrix};

macro_rules! matrix_message {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name<T: Elem>(pub(crate) Matrix<T>);

        impl<T: Elem> $name<T> {
            pub fn from_matrix(m: Matrix<T>) -> Self {
                $name(m)
            }

            pub fn as_matrix(&self) -> &Matrix<T> {
                &self.0
            }

            pub fn into_matrix(self) -> Matrix<T> {
                self.0
            }
        }
    };
}

matrix_message!(
    /// Column vector sent from client to server, `padded_m` entries.
    Query
);

matrix_message!(
    /// Column vector sent back by the server, one entry per database row.
    Answer
);

matrix_message!(
    /// Database times public matrix, downloaded once per database snapshot.
    Hint
);

/// Client state for one outstanding query. Consumed by recovery.
pub struct Secret<T: Elem> {
    pub(crate) s: Matrix<T>,
    pub(crate) query: Matrix<T>,
}

impl<T: Elem> Secret<T> {
    /// The masked query this secret was generated with.
    pub fn query(&self) -> &Matrix<T> {
        &self.query
    }
}

/// Client state for a linearly homomorphic query.
#[derive(Clone)]
pub struct SecretLhe<T: Elem> {
    pub(crate) s: Matrix<T>,
    pub(crate) query: Matrix<T>,
    pub(crate) plaintext: Matrix<T>,
}

impl<T: Elem> SecretLhe<T> {
    pub fn query(&self) -> &Matrix<T> {
        &self.query
    }

    /// The plaintext vector that was encoded into the query.
    pub fn plaintext(&self) -> &Matrix<T> {
        &self.plaintext
    }
}

impl<T: Elem> Debug for Secret<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secret")
            .field("n", &self.s.rows())
            .field("query_len", &self.query.rows())
            .finish_non_exhaustive()
    }
}

impl<T: Elem> Debug for SecretLhe<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretLhe")
            .field("n", &self.s.rows())
            .field("query_len", &self.query.rows())
            .finish_non_exhaustive()
    }
}
