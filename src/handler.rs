//! # Handler de Requests
//! src/handler.rs
//!
//! Atiende una conexión completa: lee el request, resuelve el path
//! dentro del directorio servido y escribe la respuesta. Es la parte
//! "sin concurrencia" del servidor: cada invocación trabaja sobre una
//! única conexión y no toca estado compartido.
//!
//! El handler es genérico sobre `Read + Write`, así los tests lo
//! ejercitan con streams falsos sin abrir sockets.

use crate::http::{Method, Request, Response, StatusCode};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Component, Path, PathBuf};

/// Tamaño de los bloques de lectura/escritura del cuerpo
const CHUNK_SIZE: usize = 8192;

/// Tamaño máximo aceptado para el bloque de headers de un request
const MAX_REQUEST_SIZE: usize = 8192;

/// Resultado de atender una conexión, para métricas y logging
#[derive(Debug, Clone)]
pub struct ServedRequest {
    /// Path pedido por el cliente
    pub path: String,

    /// Código de estado enviado
    pub status: StatusCode,

    /// Bytes de cuerpo efectivamente enviados
    pub bytes_sent: u64,
}

/// Handler de archivos estáticos atado a un directorio raíz
pub struct RequestHandler {
    root: PathBuf,
}

impl RequestHandler {
    /// Crea un handler que sirve archivos desde `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Obtiene el directorio raíz servido
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Atiende una conexión: lee un request y escribe una respuesta
    ///
    /// Retorna `Ok(None)` si el cliente cerró sin mandar nada. Los
    /// errores de E/S suben al worker, que los absorbe cerrando la
    /// conexión; nunca llegan a la cola ni a otros workers.
    pub fn handle<S: Read + Write>(&self, stream: &mut S) -> io::Result<Option<ServedRequest>> {
        let raw = Self::read_header_block(stream)?;

        if raw.is_empty() {
            // El cliente conectó y cerró sin mandar datos
            return Ok(None);
        }

        let request = match Request::parse(&raw) {
            Ok(request) => request,
            Err(err) => {
                // Request ilegible: se responde 400 y la conexión se
                // considera atendida
                let response = Response::new(StatusCode::BadRequest)
                    .with_header("Content-Type", "text/plain")
                    .with_body(&format!("Invalid request: {}\n", err));
                stream.write_all(&response.to_bytes())?;
                stream.flush()?;
                return Ok(Some(ServedRequest {
                    path: "-".to_string(),
                    status: StatusCode::BadRequest,
                    bytes_sent: response.body().len() as u64,
                }));
            }
        };

        self.serve(stream, &request)
    }

    /// Lee el bloque de headers (hasta la línea vacía `\r\n\r\n`)
    ///
    /// Corta en `MAX_REQUEST_SIZE` bytes o al EOF del cliente.
    fn read_header_block<S: Read>(stream: &mut S) -> io::Result<Vec<u8>> {
        let mut buffer = [0u8; MAX_REQUEST_SIZE];
        let mut filled = 0;

        loop {
            if filled == buffer.len() {
                break;
            }

            let n = stream.read(&mut buffer[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;

            if buffer[..filled].windows(4).any(|w| w == b"\r\n\r\n") {
                break;
            }
        }

        Ok(buffer[..filled].to_vec())
    }

    /// Resuelve y escribe la respuesta para un request ya parseado
    fn serve<S: Write>(&self, stream: &mut S, request: &Request) -> io::Result<Option<ServedRequest>> {
        let path = request.path().to_string();

        let resolved = match self.resolve_path(&path) {
            Some(resolved) => resolved,
            None => {
                // Path que intenta escapar de la raíz servida
                let response = Response::new(StatusCode::Forbidden)
                    .with_header("Content-Length", "0");
                stream.write_all(&response.to_bytes())?;
                stream.flush()?;
                return Ok(Some(ServedRequest {
                    path,
                    status: StatusCode::Forbidden,
                    bytes_sent: 0,
                }));
            }
        };

        let mut file = match File::open(&resolved) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return self.respond_not_found(stream, path);
            }
            Err(err) => return Err(err),
        };

        let metadata = file.metadata()?;
        if !metadata.is_file() {
            // Directorios y demás no-archivos cuentan como no encontrados
            return self.respond_not_found(stream, path);
        }

        let head = Response::new(StatusCode::Ok)
            .with_header("Content-Type", mime_type(&resolved))
            .with_header("Content-Length", &metadata.len().to_string())
            .head_bytes();
        stream.write_all(&head)?;

        // HEAD: solo headers, sin cuerpo
        let mut bytes_sent = 0u64;
        if request.method() == Method::GET {
            // Cuerpo en bloques acotados; write_all completa las
            // escrituras parciales antes de seguir
            let mut chunk = [0u8; CHUNK_SIZE];
            loop {
                let n = file.read(&mut chunk)?;
                if n == 0 {
                    break;
                }
                stream.write_all(&chunk[..n])?;
                bytes_sent += n as u64;
            }
        }
        stream.flush()?;

        Ok(Some(ServedRequest {
            path,
            status: StatusCode::Ok,
            bytes_sent,
        }))
    }

    /// Escribe el 404 estándar (status + Content-Length: 0)
    fn respond_not_found<S: Write>(
        &self,
        stream: &mut S,
        path: String,
    ) -> io::Result<Option<ServedRequest>> {
        stream.write_all(&Response::not_found().to_bytes())?;
        stream.flush()?;
        Ok(Some(ServedRequest {
            path,
            status: StatusCode::NotFound,
            bytes_sent: 0,
        }))
    }

    /// Resuelve un path de request a un path bajo la raíz servida
    ///
    /// - `/` se mapea a `/index.html`
    /// - Cualquier componente `..` rechaza el path (retorna `None`):
    ///   el recurso debe quedar debajo de la raíz
    fn resolve_path(&self, request_path: &str) -> Option<PathBuf> {
        let relative = if request_path == "/" {
            "index.html"
        } else {
            request_path.trim_start_matches('/')
        };

        let candidate = Path::new(relative);
        for component in candidate.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                _ => return None,
            }
        }

        Some(self.root.join(candidate))
    }
}

/// Retorna el MIME type según la extensión del archivo
///
/// La tabla clásica del servidor de archivos; las extensiones
/// desconocidas se sirven como `application/octet-stream`.
pub fn mime_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("");

    match extension {
        "txt" => "text/plain",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" => "application/javascript",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "pdf" => "application/pdf",
        "json" => "application/json",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Cursor;

    /// Stream falso bidireccional para ejercitar el handler sin sockets
    struct FakeStream {
        input: Cursor<Vec<u8>>,
        output: Vec<u8>,
    }

    impl FakeStream {
        fn new(input: &[u8]) -> Self {
            Self {
                input: Cursor::new(input.to_vec()),
                output: Vec::new(),
            }
        }

        fn response_text(&self) -> String {
            String::from_utf8_lossy(&self.output).to_string()
        }
    }

    impl Read for FakeStream {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.input.read(buf)
        }
    }

    impl Write for FakeStream {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.output.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Crea un directorio temporal único para el test
    fn test_root(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("file_server_handler_{}_{}", std::process::id(), tag));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_serves_existing_file() {
        let root = test_root("ok");
        fs::write(root.join("hola.txt"), "hola mundo").unwrap();

        let handler = RequestHandler::new(&root);
        let mut stream = FakeStream::new(b"GET /hola.txt HTTP/1.0\r\n\r\n");

        let served = handler.handle(&mut stream).unwrap().unwrap();
        assert_eq!(served.status, StatusCode::Ok);
        assert_eq!(served.bytes_sent, 10);

        let text = stream.response_text();
        assert!(text.starts_with("HTTP/1.0 200 OK\r\n"));
        assert!(text.contains("Content-Type: text/plain\r\n"));
        assert!(text.contains("Content-Length: 10\r\n"));
        assert!(text.ends_with("hola mundo"));
    }

    #[test]
    fn test_missing_file_returns_404() {
        let root = test_root("missing");
        let handler = RequestHandler::new(&root);
        let mut stream = FakeStream::new(b"GET /no-existe.txt HTTP/1.0\r\n\r\n");

        let served = handler.handle(&mut stream).unwrap().unwrap();
        assert_eq!(served.status, StatusCode::NotFound);
        assert_eq!(served.bytes_sent, 0);

        let text = stream.response_text();
        assert!(text.starts_with("HTTP/1.0 404 Not Found\r\n"));
        assert!(text.contains("Content-Length: 0\r\n"));
    }

    #[test]
    fn test_root_path_maps_to_index_html() {
        let root = test_root("index");
        fs::write(root.join("index.html"), "<html>inicio</html>").unwrap();

        let handler = RequestHandler::new(&root);
        let mut stream = FakeStream::new(b"GET / HTTP/1.0\r\n\r\n");

        let served = handler.handle(&mut stream).unwrap().unwrap();
        assert_eq!(served.status, StatusCode::Ok);

        let text = stream.response_text();
        assert!(text.contains("Content-Type: text/html\r\n"));
        assert!(text.ends_with("<html>inicio</html>"));
    }

    #[test]
    fn test_path_traversal_is_forbidden() {
        let root = test_root("traversal");
        let handler = RequestHandler::new(&root);
        let mut stream = FakeStream::new(b"GET /../etc/passwd HTTP/1.0\r\n\r\n");

        let served = handler.handle(&mut stream).unwrap().unwrap();
        assert_eq!(served.status, StatusCode::Forbidden);

        let text = stream.response_text();
        assert!(text.starts_with("HTTP/1.0 403 Forbidden\r\n"));
    }

    #[test]
    fn test_nested_traversal_is_forbidden() {
        let root = test_root("nested_traversal");
        let handler = RequestHandler::new(&root);
        let mut stream = FakeStream::new(b"GET /docs/../../secreto HTTP/1.0\r\n\r\n");

        let served = handler.handle(&mut stream).unwrap().unwrap();
        assert_eq!(served.status, StatusCode::Forbidden);
    }

    #[test]
    fn test_head_sends_headers_without_body() {
        let root = test_root("head");
        fs::write(root.join("a.txt"), "contenido").unwrap();

        let handler = RequestHandler::new(&root);
        let mut stream = FakeStream::new(b"HEAD /a.txt HTTP/1.0\r\n\r\n");

        let served = handler.handle(&mut stream).unwrap().unwrap();
        assert_eq!(served.status, StatusCode::Ok);
        assert_eq!(served.bytes_sent, 0);

        let text = stream.response_text();
        assert!(text.contains("Content-Length: 9\r\n"));
        assert!(text.ends_with("\r\n\r\n"));
    }

    #[test]
    fn test_directory_request_is_not_found() {
        let root = test_root("dir");
        fs::create_dir_all(root.join("carpeta")).unwrap();

        let handler = RequestHandler::new(&root);
        let mut stream = FakeStream::new(b"GET /carpeta HTTP/1.0\r\n\r\n");

        let served = handler.handle(&mut stream).unwrap().unwrap();
        assert_eq!(served.status, StatusCode::NotFound);
    }

    #[test]
    fn test_bad_request_gets_400() {
        let root = test_root("bad");
        let handler = RequestHandler::new(&root);
        let mut stream = FakeStream::new(b"PUT /cosa HTTP/1.0\r\n\r\n");

        let served = handler.handle(&mut stream).unwrap().unwrap();
        assert_eq!(served.status, StatusCode::BadRequest);

        let text = stream.response_text();
        assert!(text.starts_with("HTTP/1.0 400 Bad Request\r\n"));
    }

    #[test]
    fn test_empty_connection_returns_none() {
        let root = test_root("empty");
        let handler = RequestHandler::new(&root);
        let mut stream = FakeStream::new(b"");

        assert!(handler.handle(&mut stream).unwrap().is_none());
        assert!(stream.output.is_empty());
    }

    #[test]
    fn test_large_file_is_sent_complete() {
        // Más grande que un bloque: obliga a varias iteraciones del
        // loop de escritura
        let root = test_root("large");
        let content = vec![b'x'; CHUNK_SIZE * 3 + 17];
        fs::write(root.join("grande.bin"), &content).unwrap();

        let handler = RequestHandler::new(&root);
        let mut stream = FakeStream::new(b"GET /grande.bin HTTP/1.0\r\n\r\n");

        let served = handler.handle(&mut stream).unwrap().unwrap();
        assert_eq!(served.bytes_sent, content.len() as u64);

        let text = stream.response_text();
        assert!(text.contains("Content-Type: application/octet-stream\r\n"));
        assert!(text.contains(&format!("Content-Length: {}\r\n", content.len())));
    }

    #[test]
    fn test_mime_types() {
        assert_eq!(mime_type(Path::new("a.txt")), "text/plain");
        assert_eq!(mime_type(Path::new("a.html")), "text/html");
        assert_eq!(mime_type(Path::new("a.jpg")), "image/jpeg");
        assert_eq!(mime_type(Path::new("a.jpeg")), "image/jpeg");
        assert_eq!(mime_type(Path::new("a.png")), "image/png");
        assert_eq!(mime_type(Path::new("a.pdf")), "application/pdf");
        assert_eq!(mime_type(Path::new("sin_extension")), "application/octet-stream");
        assert_eq!(mime_type(Path::new("raro.xyz")), "application/octet-stream");
    }
}
