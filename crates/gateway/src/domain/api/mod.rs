/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
pub mod healthcheck;
pub mod login;
pub mod proxy;

use crate::middleware::BearerAuth;
use actix_web::web::{self, ServiceConfig};

pub fn handler(config: &mut ServiceConfig) {
    config
        .service(login::login)
        .service(healthcheck::health_check)
        .service(
            web::scope("/api/v1/drivers")
                .wrap(BearerAuth)
                .default_service(web::to(proxy::forward)),
        );
}
