/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use serde::{Deserialize, Serialize};

pub use crate::environment::AppState;

/// Claims carried by gateway issued tokens.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Claims {
    pub user: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct ResponseData {
    pub result: String,
}
