//! HTTP/1.1 over TLS with rustls. ALPN advertises `http/1.1`; HTTP/2
//! negotiation is a host-transport concern.

use super::worker::WorkerPool;
use super::TransportError;
use crate::router::Router;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::{ServerConfig, ServerConnection, StreamOwned};
use std::fs::File;
use std::io::BufReader;
use std::net::TcpListener;
use std::path::Path;
use std::sync::Arc;

pub(crate) fn serve(
    router: Arc<Router>,
    addr: &str,
    cert_file: &Path,
    key_file: &Path,
) -> Result<(), TransportError> {
    let config = Arc::new(load_config(cert_file, key_file)?);
    let listener = TcpListener::bind(addr)?;
    let local = listener.local_addr()?;
    router.state.record_bound(local);
    let pool = WorkerPool::new(WorkerPool::default_size());
    tracing::info!(addr = %local, "tls transport listening");

    loop {
        let (stream, peer) = match listener.accept() {
            Ok(pair) => pair,
            Err(err) => {
                if router.state.is_shutting_down() {
                    break;
                }
                tracing::error!(error = %err, "accept failed");
                continue;
            }
        };
        if router.state.is_shutting_down() {
            break;
        }

        let conn = match ServerConnection::new(Arc::clone(&config)) {
            Ok(conn) => conn,
            Err(err) => {
                tracing::error!(error = %err, "tls session setup failed");
                continue;
            }
        };
        let _ = stream.set_read_timeout(Some(router.http2.idle_timeout));
        let peer = peer.to_string();
        let router = Arc::clone(&router);
        pool.execute(Box::new(move || {
            let tls = StreamOwned::new(conn, stream);
            if let Err(err) = super::http1::handle_connection(tls, peer, &router) {
                tracing::debug!(error = %err, "tls connection failed");
            }
        }));
    }

    pool.shutdown();
    router.state.clear_bound();
    tracing::info!("tls transport stopped");
    Ok(())
}

fn load_config(cert_file: &Path, key_file: &Path) -> Result<ServerConfig, TransportError> {
    let certs: Vec<CertificateDer<'static>> =
        rustls_pemfile::certs(&mut BufReader::new(File::open(cert_file)?))
            .collect::<Result<_, _>>()?;
    if certs.is_empty() {
        return Err(TransportError::BadCertificate(format!(
            "no certificates in {}",
            cert_file.display()
        )));
    }
    let key: PrivateKeyDer<'static> =
        rustls_pemfile::private_key(&mut BufReader::new(File::open(key_file)?))?.ok_or_else(
            || TransportError::BadCertificate(format!("no private key in {}", key_file.display())),
        )?;

    let mut config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)?;
    config.alpn_protocols = vec![b"http/1.1".to_vec()];
    Ok(config)
}
